//! The six user-record actions, each bound to one `UserDirectory` call.
//!
//! A `UserPanel` carries the record it works on (`PanelConfig`), so triggering
//! an action takes no arguments. Writes run in the background and only log how
//! they ended; reads log the value they found.

use super::{ReadOutcome, UserDirectory, EMAIL_FIELD, USERNAME_FIELD};
use crate::database::store::Store;
use crate::database::DatabaseError;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::task::JoinHandle;

/// The record a panel works on and the values it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelConfig {
    pub items_name: String,
    pub user_id: String,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    WriteUser,
    UpdateUsername,
    UpdateEmail,
    DeleteUser,
    GetUsername,
    GetEmail,
}

impl Trigger {
    pub const ALL: [Trigger; 6] = [
        Trigger::WriteUser,
        Trigger::UpdateUsername,
        Trigger::UpdateEmail,
        Trigger::DeleteUser,
        Trigger::GetUsername,
        Trigger::GetEmail,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::WriteUser => "write-user",
            Trigger::UpdateUsername => "update-username",
            Trigger::UpdateEmail => "update-email",
            Trigger::DeleteUser => "delete-user",
            Trigger::GetUsername => "get-username",
            Trigger::GetEmail => "get-email",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown trigger {0:?}")]
pub struct UnknownTrigger(pub String);

impl FromStr for Trigger {
    type Err = UnknownTrigger;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Trigger::ALL
            .into_iter()
            .find(|trigger| trigger.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownTrigger(s.to_string()))
    }
}

pub struct UserPanel<S> {
    directory: UserDirectory<S>,
    config: PanelConfig,
}

impl<S: Store + 'static> UserPanel<S> {
    pub fn new(directory: UserDirectory<S>, config: PanelConfig) -> Self {
        Self { directory, config }
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn directory(&self) -> &UserDirectory<S> {
        &self.directory
    }

    /// Fires the action bound to `trigger`.
    ///
    /// The returned handle may be dropped; the action still runs to completion.
    pub fn click(&self, trigger: Trigger) -> JoinHandle<()> {
        let directory = self.directory.clone();
        let config = self.config.clone();
        tracing::debug!(%trigger, user_id = %config.user_id, "trigger fired");

        match trigger {
            Trigger::WriteUser => tokio::spawn(async move {
                let result = directory
                    .create_record(
                        &config.items_name,
                        &config.user_id,
                        &config.username,
                        &config.email,
                    )
                    .await;
                log_write(trigger, result);
            }),
            Trigger::UpdateUsername => tokio::spawn(async move {
                let result = directory
                    .update_field(
                        &config.items_name,
                        &config.user_id,
                        USERNAME_FIELD,
                        config.username.as_str(),
                    )
                    .await;
                log_write(trigger, result);
            }),
            Trigger::UpdateEmail => tokio::spawn(async move {
                let result = directory
                    .update_field(
                        &config.items_name,
                        &config.user_id,
                        EMAIL_FIELD,
                        config.email.as_str(),
                    )
                    .await;
                log_write(trigger, result);
            }),
            Trigger::DeleteUser => tokio::spawn(async move {
                let result = directory
                    .delete_record(&config.items_name, &config.user_id)
                    .await;
                log_write(trigger, result);
            }),
            Trigger::GetUsername => directory.read_field_then(
                &config.items_name,
                &config.user_id,
                USERNAME_FIELD,
                move |outcome| log_read(trigger, outcome),
            ),
            Trigger::GetEmail => directory.read_field_then(
                &config.items_name,
                &config.user_id,
                EMAIL_FIELD,
                move |outcome| log_read(trigger, outcome),
            ),
        }
    }
}

fn log_write(trigger: Trigger, result: Result<(), DatabaseError>) {
    match result {
        Ok(()) => tracing::debug!(%trigger, "write completed"),
        Err(e) => tracing::warn!(%trigger, error = %e, "write failed"),
    }
}

fn log_read(trigger: Trigger, outcome: ReadOutcome) {
    match outcome {
        ReadOutcome::Faulted(e) => tracing::error!(%trigger, error = %e, "read failed"),
        ReadOutcome::Completed(Some(value)) => {
            tracing::info!(%trigger, value = %raw_text(&value), "read completed")
        }
        ReadOutcome::Completed(None) => tracing::info!(%trigger, "read completed: no value"),
    }
}

/// Strings print bare, everything else as JSON.
pub(crate) fn raw_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        other => Cow::Owned(other.to_string()),
    }
}
