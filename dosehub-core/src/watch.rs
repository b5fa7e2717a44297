use chrono::Local;
use futures_util::StreamExt;
use log::debug;
use tokio::{task::JoinHandle, time::sleep};

use crate::{Evaluator, HubId, NotificationSink, Store, TrackerContext};

/// Keeps a hub's watch tasks alive. Dropping the handle tears down both the
/// snapshot subscription and the reconciler, so nothing can act on a hub the
/// user has left.
pub struct WatchHandle {
    hub_id: HubId,
    subscription: JoinHandle<()>,
    reconciler: JoinHandle<()>,
}

impl WatchHandle {
    pub fn new<S, N>(context: &TrackerContext<S, N>, hub_id: HubId) -> Self
    where
        S: Store,
        N: NotificationSink,
    {
        Self {
            subscription: spawn_subscription_task(context, hub_id.clone()),
            reconciler: spawn_reconcile_task(context),
            hub_id,
        }
    }

    pub fn hub_id(&self) -> &HubId {
        &self.hub_id
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.subscription.abort();
        self.reconciler.abort();

        debug!("Stopped watching hub {}", self.hub_id);
    }
}

fn spawn_subscription_task<S, N>(context: &TrackerContext<S, N>, hub_id: HubId) -> JoinHandle<()>
where
    S: Store,
    N: NotificationSink,
{
    let evaluator = Evaluator::new(context);
    let store = context.store.clone();

    tokio::spawn(async move {
        let mut snapshots = store.watch_medications(&hub_id);

        while let Some(records) = snapshots.next().await {
            let today = Local::now().date_naive();

            evaluator.ingest_snapshot(&hub_id, records, today).await;
        }

        debug!("Snapshots for hub {hub_id} ended");
    })
}

fn spawn_reconcile_task<S, N>(context: &TrackerContext<S, N>) -> JoinHandle<()>
where
    S: Store,
    N: NotificationSink,
{
    let evaluator = Evaluator::new(context);
    let tick_rate = context.config.tick_rate();

    tokio::spawn(async move {
        loop {
            let now = Local::now().naive_local();

            evaluator.reconcile(now).await;

            sleep(tick_rate).await;
        }
    })
}
