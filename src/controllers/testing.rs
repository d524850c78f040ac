//! Scripted in-memory providers for controller tests.
//!
//! Each call pops the next scripted reply. A reply is either ready now or
//! held back behind a `oneshot` so a test decides when (and in which order)
//! responses arrive.

use crate::api::{NewsProvider, SubscriptionProvider};
use crate::error::ProviderError;
use crate::models::{NewsResponse, SubscriptionReply, SubscriptionRequest};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::oneshot;

pub(crate) type ReplySender<T> = oneshot::Sender<Result<T, ProviderError>>;

enum Reply<T> {
    Now(Result<T, ProviderError>),
    Later(oneshot::Receiver<Result<T, ProviderError>>),
}

struct Script<T> {
    replies: Mutex<VecDeque<Reply<T>>>,
    calls: AtomicUsize,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }
}

impl<T> Script<T> {
    fn push_now(&self, reply: Result<T, ProviderError>) {
        self.replies.lock().unwrap().push_back(Reply::Now(reply));
    }

    fn push_later(&self) -> ReplySender<T> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Later(rx));
        tx
    }

    async fn next(&self) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Now(result)) => result,
            Some(Reply::Later(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ProviderError::Other("reply dropped".to_string()))),
            None => Err(ProviderError::Other("unscripted call".to_string())),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub(crate) fn failure(message: &str) -> ProviderError {
    ProviderError::Other(message.to_string())
}

#[derive(Default)]
pub(crate) struct ScriptedNews {
    reads: Script<NewsResponse>,
    triggers: Script<()>,
}

impl ScriptedNews {
    pub(crate) fn read_ok(&self, news: NewsResponse) {
        self.reads.push_now(Ok(news));
    }

    pub(crate) fn read_err(&self) {
        self.reads.push_now(Err(failure("read failed")));
    }

    pub(crate) fn read_later(&self) -> ReplySender<NewsResponse> {
        self.reads.push_later()
    }

    pub(crate) fn trigger_ok(&self) {
        self.triggers.push_now(Ok(()));
    }

    pub(crate) fn trigger_later(&self) -> ReplySender<()> {
        self.triggers.push_later()
    }

    pub(crate) fn trigger_err(&self) {
        self.triggers.push_now(Err(failure("trigger failed")));
    }

    pub(crate) fn read_calls(&self) -> usize {
        self.reads.calls()
    }

    pub(crate) fn trigger_calls(&self) -> usize {
        self.triggers.calls()
    }
}

impl NewsProvider for ScriptedNews {
    async fn read_aggregated_news(&self) -> Result<NewsResponse, ProviderError> {
        self.reads.next().await
    }

    async fn trigger_aggregation(&self) -> Result<(), ProviderError> {
        self.triggers.next().await
    }
}

#[derive(Default)]
pub(crate) struct ScriptedSubscriptions {
    replies: Script<SubscriptionReply>,
    requests: Mutex<Vec<SubscriptionRequest>>,
}

impl ScriptedSubscriptions {
    pub(crate) fn reply_ok(&self, message: Option<&str>) {
        self.replies.push_now(Ok(SubscriptionReply {
            message: message.map(str::to_string),
        }));
    }

    pub(crate) fn reply_err(&self, error: ProviderError) {
        self.replies.push_now(Err(error));
    }

    pub(crate) fn reply_later(&self) -> ReplySender<SubscriptionReply> {
        self.replies.push_later()
    }

    pub(crate) fn calls(&self) -> usize {
        self.replies.calls()
    }

    pub(crate) fn requests(&self) -> Vec<SubscriptionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl SubscriptionProvider for ScriptedSubscriptions {
    async fn create_subscription(
        &self,
        request: SubscriptionRequest,
    ) -> Result<SubscriptionReply, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.replies.next().await
    }
}
