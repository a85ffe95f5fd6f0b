use ethers::abi::{Detokenize, RawLog};
use ethers::contract::ContractCall;
use ethers::providers::Middleware;
use ethers::types::{Address, Log, U64};
use log::info;

use super::{TxError, TxResult};
use crate::domain::Receipt;

pub(crate) fn raw_log(log: &Log) -> RawLog {
    RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    }
}

/// Sends `call` from `from`, waits for the receipt and decodes the logs the
/// contract at `emitter` produced.
pub(crate) async fn send<M, D, E, F>(
    call: ContractCall<M, D>,
    from: Address,
    emitter: Address,
    decode: F,
) -> TxResult<E>
where
    M: Middleware + 'static,
    D: Detokenize,
    F: Fn(&Log) -> Option<E>,
{
    let call = call.from(from);
    let pending = call.send().await.map_err(TxError::from)?;
    let tx_hash = pending.tx_hash();

    let receipt = pending
        .await
        .map_err(|e| TxError::Provider(e.to_string()))?
        .ok_or(TxError::NoReceipt)?;

    if receipt.status == Some(U64::zero()) {
        return Err(TxError::Reverted {
            reason: None,
            data: None,
        });
    }

    info!("⛓️  Mined {:?}", tx_hash);

    Ok(Receipt {
        block: receipt.block_number.map(|b| b.as_u64()).unwrap_or_default(),
        events: receipt
            .logs
            .iter()
            .filter(|l| l.address == emitter)
            .filter_map(decode)
            .collect(),
    })
}
