//! Delivery of operation results to a caller-chosen execution context.
//!
//! Operations run on the tokio runtime. Their single result is handed to a
//! [`ResultSink`], so a host with a UI thread can drain a channel there
//! instead of being called back on a runtime worker.

use crate::error::Result;
use crate::models::{Account, AccountBalance, Pagination, Transaction};
use crate::mondo::MondoOperations;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub trait ResultSink<T>: Send + 'static {
    fn deliver(self, result: Result<T>);
}

/// Forwards results into an unbounded channel.
pub struct ChannelSink<T> {
    sender: mpsc::UnboundedSender<Result<T>>,
}

impl<T> Clone for ChannelSink<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T: Send + 'static> ResultSink<T> for ChannelSink<T> {
    fn deliver(self, result: Result<T>) {
        if self.sender.send(result).is_err() {
            debug!("Result receiver dropped before delivery");
        }
    }
}

/// A sink and the receiver the host drains on its own context.
pub fn channel<T>() -> (ChannelSink<T>, mpsc::UnboundedReceiver<Result<T>>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelSink { sender }, receiver)
}

/// Invokes a closure with the result.
pub struct CallbackSink<F>(pub F);

impl<T, F> ResultSink<T> for CallbackSink<F>
where
    F: FnOnce(Result<T>) + Send + 'static,
{
    fn deliver(self, result: Result<T>) {
        (self.0)(result)
    }
}

pub struct Dispatcher<C> {
    client: Arc<C>,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C> Dispatcher<C>
where
    C: MondoOperations + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub fn list_accounts<S>(&self, sink: S) -> JoinHandle<()>
    where
        S: ResultSink<Vec<Account>>,
    {
        let client = self.client.clone();
        tokio::spawn(async move { sink.deliver(client.list_accounts().await) })
    }

    pub fn get_balance<S>(&self, account: Account, sink: S) -> JoinHandle<()>
    where
        S: ResultSink<AccountBalance>,
    {
        let client = self.client.clone();
        tokio::spawn(async move { sink.deliver(client.get_balance(&account).await) })
    }

    pub fn list_transactions<S>(
        &self,
        account: Account,
        expand_merchant: bool,
        pagination: Option<Pagination>,
        sink: S,
    ) -> JoinHandle<()>
    where
        S: ResultSink<Vec<Transaction>>,
    {
        let client = self.client.clone();
        tokio::spawn(async move {
            let result = client
                .list_transactions(&account, expand_merchant, pagination.as_ref())
                .await;
            sink.deliver(result)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::MockMondoClient;
    use super::*;
    use crate::models::account::test_helpers::mock_account;
    use crate::models::transaction::test_helpers::{mock_datetime, mock_transaction};
    use std::sync::Mutex;

    fn dispatcher() -> Dispatcher<MockMondoClient> {
        Dispatcher::new(Arc::new(MockMondoClient {
            accounts: vec![mock_account()],
            transactions: vec![
                mock_transaction("tx_1", -100, mock_datetime(2016, 1, 1)),
                mock_transaction("tx_2", -200, mock_datetime(2016, 1, 2)),
            ],
        }))
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_once() {
        let (sink, mut receiver) = channel();
        dispatcher().list_accounts(sink).await.unwrap();

        let accounts = receiver.recv().await.unwrap().unwrap();
        assert_eq!(accounts, vec![mock_account()]);
        // The only sender was consumed by the delivery
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_errors_reach_sink() {
        let (sink, mut receiver) = channel();
        dispatcher()
            .get_balance(mock_account(), sink)
            .await
            .unwrap();

        let error = receiver.recv().await.unwrap().unwrap_err();
        assert_eq!(error.status(), Some(403));
    }

    #[tokio::test]
    async fn test_callback_sink() {
        let delivered = Arc::new(Mutex::new(None));
        let slot = delivered.clone();

        dispatcher()
            .list_transactions(
                mock_account(),
                false,
                Some(Pagination::default().limit(1)),
                CallbackSink(move |result: Result<Vec<Transaction>>| {
                    *slot.lock().unwrap() = Some(result.unwrap().len());
                }),
            )
            .await
            .unwrap();

        assert_eq!(*delivered.lock().unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_ignored() {
        let (sink, receiver) = channel::<Vec<Account>>();
        drop(receiver);

        let handle = dispatcher().list_accounts(sink);
        assert!(handle.await.is_ok());
    }
}
