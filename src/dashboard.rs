use crate::client::DashboardClient;
use crate::models::{AchievementProgressMap, DashboardStats};
use std::time::Duration;
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardView {
    pub stats: Option<DashboardStats>,
    pub achievements: Option<AchievementProgressMap>,
    pub refreshes: u64,
}

/// Keeps stats and achievement progress fresh on a fixed period.
pub struct DashboardPoller {
    handle: JoinHandle<()>,
    view: watch::Receiver<DashboardView>,
}

impl DashboardPoller {
    /// The first refresh happens immediately.
    pub fn spawn(client: DashboardClient, every: Duration) -> Self {
        let (tx, view) = watch::channel(DashboardView::default());
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(every);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let stats = client.stats().await;
                let achievements = client.achievement_progress().await;
                tx.send_modify(|view| {
                    apply_refresh(view, stats, achievements);
                });
                if tx.is_closed() {
                    debug!("dashboard view dropped; stopping refresh");
                    break;
                }
            }
        });
        Self { handle, view }
    }

    pub fn view(&self) -> watch::Receiver<DashboardView> {
        self.view.clone()
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for DashboardPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A failed fetch keeps the last good value.
fn apply_refresh<E: std::fmt::Display>(
    view: &mut DashboardView,
    stats: Result<DashboardStats, E>,
    achievements: Result<AchievementProgressMap, E>,
) {
    match stats {
        Ok(stats) => view.stats = Some(stats),
        Err(err) => warn!("failed to refresh dashboard stats: {err}"),
    }
    match achievements {
        Ok(achievements) => view.achievements = Some(achievements),
        Err(err) => warn!("failed to refresh achievement progress: {err}"),
    }
    view.refreshes += 1;
}
