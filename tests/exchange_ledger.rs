mod common;

use common::{addr, setup, Fixture, FEE_PERCENT, NOW};
use ethers::types::{Address, U256};
use sigma_dex::contract::{ExchangeGateway, TokenGateway, TxError};
use sigma_dex::domain::{ExchangeEvent, NewOrder};
use sigma_dex::helpers::{units, ETHER_ADDRESS};
use sigma_dex::sim::Revert;

fn tenth(n: u64) -> U256 {
    units(n) / U256::from(10)
}

/// Offers `give` ether for `get` SIG.
fn buy(f: &Fixture, get: U256, give: U256) -> NewOrder {
    NewOrder {
        token_get: f.token.address(),
        amount_get: get,
        token_give: ETHER_ADDRESS,
        amount_give: give,
    }
}

async fn deposit_tokens(f: &Fixture, user: Address, amount: U256) {
    f.token.approve(user, f.exchange.address(), amount).await.unwrap();
    f.exchange
        .deposit_token(user, f.token.address(), amount)
        .await
        .unwrap();
}

// ==================================================
// DEPLOYMENT
// ==================================================

#[tokio::test]
async fn tracks_fee_account_and_percent() {
    let f = setup().await;
    assert_eq!(f.exchange.fee_account().await.unwrap(), f.fee_account);
    assert_eq!(f.exchange.fee_percent().await.unwrap(), U256::from(FEE_PERCENT));
}

#[tokio::test]
async fn plain_ether_sends_are_rejected() {
    let f = setup().await;
    let err = f
        .chain
        .send_ether(f.user1, f.exchange.address(), units(1))
        .await
        .unwrap_err();
    assert!(err.is_revert());
    assert_eq!(f.exchange.native_balance(f.user1).await.unwrap(), units(100));
}

// ==================================================
// ETHER
// ==================================================

#[tokio::test]
async fn ether_deposits_accumulate_and_report_the_balance() {
    let f = setup().await;
    let mut expected = U256::zero();

    for amount in [units(1), tenth(5), U256::from(1u64), units(7)] {
        let before = f.exchange.balance_of(ETHER_ADDRESS, f.user1).await.unwrap();
        let receipt = f.exchange.deposit_ether(f.user1, amount).await.unwrap();
        expected += amount;

        let after = f.exchange.balance_of(ETHER_ADDRESS, f.user1).await.unwrap();
        assert_eq!(after, before + amount);
        assert_eq!(
            receipt.first_event(),
            Some(&ExchangeEvent::Deposit {
                token: ETHER_ADDRESS,
                user: f.user1,
                amount,
                balance: expected,
            })
        );
    }

    assert_eq!(
        f.exchange.native_balance(f.user1).await.unwrap(),
        units(100) - expected
    );
}

#[tokio::test]
async fn ether_deposit_needs_wallet_funds() {
    let f = setup().await;
    let err = f.exchange.deposit_ether(f.user1, units(101)).await.unwrap_err();
    assert_eq!(err, Revert::InsufficientBalance.into());
}

#[tokio::test]
async fn withdrawing_the_full_ether_balance_leaves_zero() {
    let f = setup().await;
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();

    let receipt = f.exchange.withdraw_ether(f.user1, units(1)).await.unwrap();
    assert_eq!(
        receipt.first_event(),
        Some(&ExchangeEvent::Withdraw {
            token: ETHER_ADDRESS,
            user: f.user1,
            amount: units(1),
            balance: U256::zero(),
        })
    );
    assert_eq!(
        f.exchange.balance_of(ETHER_ADDRESS, f.user1).await.unwrap(),
        U256::zero()
    );
    assert_eq!(f.exchange.native_balance(f.user1).await.unwrap(), units(100));
}

#[tokio::test]
async fn over_withdrawing_ether_is_rejected() {
    let f = setup().await;
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();

    let err = f.exchange.withdraw_ether(f.user1, units(2)).await.unwrap_err();
    assert!(err.is_revert());
    assert_eq!(
        f.exchange.balance_of(ETHER_ADDRESS, f.user1).await.unwrap(),
        units(1)
    );
}

// ==================================================
// TOKENS
// ==================================================

#[tokio::test]
async fn token_deposit_pulls_from_the_wallet() {
    let f = setup().await;
    let sig = f.token.address();
    f.token.approve(f.user1, f.exchange.address(), units(10)).await.unwrap();

    let receipt = f.exchange.deposit_token(f.user1, sig, units(10)).await.unwrap();
    assert_eq!(
        receipt.first_event(),
        Some(&ExchangeEvent::Deposit {
            token: sig,
            user: f.user1,
            amount: units(10),
            balance: units(10),
        })
    );
    assert_eq!(f.exchange.balance_of(sig, f.user1).await.unwrap(), units(10));
    assert_eq!(f.token.balance_of(f.user1).await.unwrap(), units(90));
    assert_eq!(
        f.token.balance_of(f.exchange.address()).await.unwrap(),
        units(10)
    );
    assert_eq!(
        f.token.allowance(f.user1, f.exchange.address()).await.unwrap(),
        U256::zero()
    );
}

#[tokio::test]
async fn token_deposit_without_approval_is_rejected() {
    let f = setup().await;
    let err = f
        .exchange
        .deposit_token(f.user1, f.token.address(), units(10))
        .await
        .unwrap_err();
    assert_eq!(err, Revert::InsufficientAllowance.into());
    assert_eq!(
        f.exchange.balance_of(f.token.address(), f.user1).await.unwrap(),
        U256::zero()
    );
}

#[tokio::test]
async fn the_ether_sentinel_is_never_a_token() {
    let f = setup().await;
    let err = f
        .exchange
        .deposit_token(f.user1, ETHER_ADDRESS, units(1))
        .await
        .unwrap_err();
    assert_eq!(err, Revert::NativeCurrencyAsToken.into());

    let err = f
        .exchange
        .withdraw_token(f.user1, ETHER_ADDRESS, units(1))
        .await
        .unwrap_err();
    assert_eq!(err, Revert::NativeCurrencyAsToken.into());
}

#[tokio::test]
async fn token_withdrawal_returns_tokens() {
    let f = setup().await;
    let sig = f.token.address();
    deposit_tokens(&f, f.user1, units(10)).await;

    let err = f.exchange.withdraw_token(f.user1, sig, units(11)).await.unwrap_err();
    assert!(err.is_revert());

    let receipt = f.exchange.withdraw_token(f.user1, sig, units(10)).await.unwrap();
    assert_eq!(
        receipt.first_event(),
        Some(&ExchangeEvent::Withdraw {
            token: sig,
            user: f.user1,
            amount: units(10),
            balance: U256::zero(),
        })
    );
    assert_eq!(f.token.balance_of(f.user1).await.unwrap(), units(100));
}

// ==================================================
// ORDERS
// ==================================================

#[tokio::test]
async fn order_ids_start_at_one_and_increase() {
    let f = setup().await;
    let terms = buy(&f, units(1), units(1));

    for expected in 1..=3u64 {
        let receipt = f.exchange.make_order(f.user1, terms).await.unwrap();
        match receipt.first_event() {
            Some(ExchangeEvent::Order(order)) => assert_eq!(order.id, U256::from(expected)),
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(f.exchange.order_count().await.unwrap(), U256::from(3));

    let stored = f.exchange.order(U256::from(2)).await.unwrap().unwrap();
    assert_eq!(stored.user, f.user1);
    assert_eq!(stored.token_get, f.token.address());
    assert_eq!(stored.amount_get, units(1));
    assert_eq!(stored.token_give, ETHER_ADDRESS);
    assert_eq!(stored.amount_give, units(1));
    assert_eq!(stored.timestamp, NOW);

    assert_eq!(f.exchange.order(U256::from(4)).await.unwrap(), None);
}

#[tokio::test]
async fn fill_charges_the_filler_a_fee() {
    let f = setup().await;
    let sig = f.token.address();

    // user1 offers 1 ether for 1 SIG
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();
    deposit_tokens(&f, f.user2, units(2)).await;

    let receipt = f.exchange.fill_order(f.user2, U256::one()).await.unwrap();
    match receipt.first_event() {
        Some(ExchangeEvent::Trade(trade)) => {
            assert_eq!(trade.id(), U256::one());
            assert_eq!(trade.order.user, f.user1);
            assert_eq!(trade.user_fill, f.user2);
        }
        other => panic!("unexpected event {:?}", other),
    }

    let balance = |token: Address, user: Address| {
        let exchange = f.exchange.clone();
        async move { exchange.balance_of(token, user).await.unwrap() }
    };
    assert_eq!(balance(sig, f.user1).await, units(1));
    assert_eq!(balance(ETHER_ADDRESS, f.user1).await, U256::zero());
    assert_eq!(balance(sig, f.user2).await, tenth(9));
    assert_eq!(balance(ETHER_ADDRESS, f.user2).await, units(1));
    assert_eq!(balance(sig, f.fee_account).await, tenth(1));

    assert!(f.exchange.order_filled(U256::one()).await.unwrap());
}

#[tokio::test]
async fn an_order_fills_exactly_once() {
    let f = setup().await;
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();
    deposit_tokens(&f, f.user2, units(5)).await;

    f.exchange.fill_order(f.user2, U256::one()).await.unwrap();
    let err = f.exchange.fill_order(f.user2, U256::one()).await.unwrap_err();
    assert_eq!(err, Revert::OrderAlreadyFilled.into());

    // a filled order can no longer be cancelled either
    let err = f.exchange.cancel_order(f.user1, U256::one()).await.unwrap_err();
    assert!(err.is_revert());
    assert!(!f.exchange.order_cancelled(U256::one()).await.unwrap());
}

#[tokio::test]
async fn fill_rejects_cancelled_and_unknown_orders() {
    let f = setup().await;
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();
    deposit_tokens(&f, f.user2, units(5)).await;

    f.exchange.cancel_order(f.user1, U256::one()).await.unwrap();
    let err = f.exchange.fill_order(f.user2, U256::one()).await.unwrap_err();
    assert_eq!(err, Revert::OrderAlreadyCancelled.into());

    for id in [U256::zero(), U256::from(99)] {
        let err = f.exchange.fill_order(f.user2, id).await.unwrap_err();
        assert_eq!(err, Revert::InvalidOrderId.into());
    }
    assert_eq!(
        f.exchange.balance_of(f.token.address(), f.user2).await.unwrap(),
        units(5)
    );
}

#[tokio::test]
async fn fill_without_funds_is_rejected() {
    let f = setup().await;
    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();
    // 1 SIG covers the amount but not the fee
    deposit_tokens(&f, f.user2, units(1)).await;

    let err = f.exchange.fill_order(f.user2, U256::one()).await.unwrap_err();
    assert_eq!(err, Revert::InsufficientBalance.into());
    assert!(!f.exchange.order_filled(U256::one()).await.unwrap());
}

#[tokio::test]
async fn only_the_creator_cancels_and_only_once() {
    let f = setup().await;
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();

    let err = f.exchange.cancel_order(f.user2, U256::one()).await.unwrap_err();
    assert_eq!(err, Revert::NotOrderOwner.into());

    let err = f.exchange.cancel_order(f.user1, U256::from(9)).await.unwrap_err();
    assert_eq!(err, Revert::InvalidOrderId.into());

    let receipt = f.exchange.cancel_order(f.user1, U256::one()).await.unwrap();
    match receipt.first_event() {
        Some(ExchangeEvent::Cancel(order)) => {
            assert_eq!(order.id, U256::one());
            assert_eq!(order.user, f.user1);
            assert_eq!(order.amount_get, units(1));
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(f.exchange.order_cancelled(U256::one()).await.unwrap());

    let err = f.exchange.cancel_order(f.user1, U256::one()).await.unwrap_err();
    assert_eq!(err, Revert::OrderAlreadyCancelled.into());
}

#[tokio::test]
async fn reverts_carry_a_reason() {
    let f = setup().await;
    let err = f.exchange.cancel_order(f.user1, U256::one()).await.unwrap_err();
    match &err {
        TxError::Reverted { reason, .. } => {
            assert_eq!(reason.as_deref(), Some("invalid order id"))
        }
        other => panic!("expected a revert, got {:?}", other),
    }
    assert_eq!(err.to_string(), "Transaction reverted: invalid order id");
}

#[tokio::test]
async fn history_is_queryable_by_block_range() {
    let f = setup().await;
    let start = f.exchange.head_block().await.unwrap();

    f.exchange.deposit_ether(f.user1, units(1)).await.unwrap();
    f.exchange
        .make_order(f.user1, buy(&f, units(1), units(1)))
        .await
        .unwrap();
    let head = f.exchange.head_block().await.unwrap();
    assert_eq!(head, start + 2);

    let all = f.exchange.events(start + 1, head).await.unwrap();
    let names: Vec<_> = all.iter().map(|l| l.event.name()).collect();
    assert_eq!(names, vec!["Deposit", "Order"]);

    let last = f.exchange.events(head, head).await.unwrap();
    assert_eq!(last.len(), 1);
    assert!(f.exchange.events(head, start).await.is_err());

    let unknown = addr(0x42);
    assert_eq!(
        f.exchange.balance_of(unknown, f.user1).await.unwrap(),
        U256::zero()
    );
}
