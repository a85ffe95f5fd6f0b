mod common;

use common::setup;
use ethers::types::U256;
use rust_decimal_macros::dec;
use sigma_dex::contract::{ExchangeGateway, TokenGateway};
use sigma_dex::domain::{ExchangeEvent, Side};
use sigma_dex::helpers::{units, ETHER_ADDRESS};
use sigma_dex::interactions::{self, FundsForm, OrderInput};
use sigma_dex::store::{Action, Store};

#[tokio::test]
async fn deposits_and_withdrawals_round_trip_balances() {
    let f = setup().await;
    let store = Store::new();
    let ex = f.exchange.as_ref();

    interactions::deposit_ether(ex, &store, f.user1, units(2)).await.unwrap();
    interactions::withdraw_ether(ex, &store, f.user1, units(1)).await.unwrap();
    interactions::deposit_token(ex, f.token.as_ref(), &store, f.user1, units(10))
        .await
        .unwrap();
    interactions::withdraw_token(ex, f.token.as_ref(), &store, f.user1, units(4))
        .await
        .unwrap();

    interactions::load_balances(ex, f.token.as_ref(), f.user1, &store)
        .await
        .unwrap();
    let state = store.state().await;
    assert!(!state.exchange.balances_loading);
    assert_eq!(state.exchange.ether_balance, Some(units(1)));
    assert_eq!(state.exchange.token_balance, Some(units(6)));
    assert_eq!(state.web3.balance, Some(units(99)));
    assert_eq!(state.token.balance, Some(units(94)));
}

#[tokio::test]
async fn failed_transactions_are_recorded() {
    let f = setup().await;
    let store = Store::new();

    let err = interactions::withdraw_ether(f.exchange.as_ref(), &store, f.user1, units(1))
        .await
        .unwrap_err();
    assert!(interactions::is_revert(&err));

    let state = store.state().await;
    assert!(!state.exchange.balances_loading);
    assert!(state
        .exchange
        .last_error
        .as_deref()
        .unwrap_or_default()
        .contains("insufficient balance"));
}

#[tokio::test]
async fn order_entry_places_buy_and_sell_orders() {
    let f = setup().await;
    let store = Store::new();
    let sig = f.token.address();

    store.dispatch(Action::BuyOrderAmountChanged("4".into())).await;
    store.dispatch(Action::BuyOrderPriceChanged("0.25".into())).await;
    let input = OrderInput::from_form(&store.state().await.exchange.buy_order).unwrap();

    let receipt = interactions::make_buy_order(f.exchange.as_ref(), sig, &store, f.user1, input)
        .await
        .unwrap();
    let order = match receipt.first_event() {
        Some(ExchangeEvent::Order(order)) => order.clone(),
        other => panic!("unexpected event {:?}", other),
    };
    assert_eq!(order.side(), Side::Buy);
    assert_eq!(order.amount_get, units(4));
    assert_eq!(order.amount_give, units(1));
    assert!(store.state().await.exchange.buy_order.making);

    let input = OrderInput {
        amount: dec!(2),
        price: dec!(0.5),
    };
    interactions::make_sell_order(f.exchange.as_ref(), sig, &store, f.user2, input)
        .await
        .unwrap();
    let sell = f.exchange.order(U256::from(2)).await.unwrap().unwrap();
    assert_eq!(sell.side(), Side::Sell);
    assert_eq!(sell.token_get, ETHER_ADDRESS);
    assert_eq!(sell.amount_get, units(1));
    assert_eq!(sell.amount_give, units(2));
}

#[tokio::test]
async fn balance_forms_drive_deposits_and_withdrawals() {
    let f = setup().await;
    let store = Store::new();
    let ex = f.exchange.as_ref();
    let sig = f.token.address();

    store.dispatch(Action::EtherDepositAmountChanged("2.5".into())).await;
    store.dispatch(Action::TokenDepositAmountChanged("10".into())).await;
    store.dispatch(Action::EtherWithdrawAmountChanged("0.5".into())).await;
    store.dispatch(Action::TokenWithdrawAmountChanged("4".into())).await;

    for form in [
        FundsForm::EtherDeposit,
        FundsForm::TokenDeposit,
        FundsForm::EtherWithdraw,
        FundsForm::TokenWithdraw,
    ] {
        interactions::submit_funds(ex, f.token.as_ref(), &store, f.user1, form)
            .await
            .unwrap();
    }

    assert_eq!(ex.balance_of(ETHER_ADDRESS, f.user1).await.unwrap(), units(2));
    assert_eq!(ex.balance_of(sig, f.user1).await.unwrap(), units(6));
    assert_eq!(f.token.balance_of(f.user1).await.unwrap(), units(94));
}

#[tokio::test]
async fn empty_or_invalid_forms_send_nothing() {
    let f = setup().await;
    let store = Store::new();
    let ex = f.exchange.as_ref();
    let head = ex.head_block().await.unwrap();

    let err = interactions::submit_funds(ex, f.token.as_ref(), &store, f.user1, FundsForm::EtherDeposit)
        .await
        .unwrap_err();
    assert!(!interactions::is_revert(&err));

    store.dispatch(Action::TokenDepositAmountChanged("abc".into())).await;
    assert!(
        interactions::submit_funds(ex, f.token.as_ref(), &store, f.user1, FundsForm::TokenDeposit)
            .await
            .is_err()
    );

    assert_eq!(ex.head_block().await.unwrap(), head);
    assert!(!store.state().await.exchange.balances_loading);
}
