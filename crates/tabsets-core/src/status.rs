//! Status display driving

use std::sync::Arc;

use tokio::sync::watch;

pub trait StatusDisplay: Send + Sync {
    fn show(&self, text: &str);
}

pub fn status_text(active: Option<&str>) -> String {
    match active {
        Some(name) => format!("Tabset: {name}"),
        None => "Tabset: (none)".to_string(),
    }
}

/// Show the current active tabset, then every change, until the manager
/// goes away.
pub async fn drive_status(
    mut status: watch::Receiver<Option<String>>,
    display: Arc<dyn StatusDisplay>,
) {
    loop {
        let text = status_text(status.borrow_and_update().as_deref());
        display.show(&text);

        if status.changed().await.is_err() {
            tracing::debug!("Status channel closed");
            break;
        }
    }
}
