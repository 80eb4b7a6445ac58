/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

use log::*;
use std::future::Future;
use std::sync::{Arc, Once};
use tokio::sync::watch;
use tokio::task;

static INIT: Once = Once::new();

pub fn init_once() {
    INIT.call_once(env_logger::init);
}

type SpawnResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
pub(crate) fn spawn_and_log_error<F>(fut: F) -> task::JoinHandle<()>
where
    F: Future<Output = SpawnResult<()>> + Send + 'static,
{
    task::spawn(async move {
        if let Err(e) = fut.await {
            error!("{}", e)
        }
    })
}

/// Shared, sticky cancellation signal. Once triggered it stays triggered, so tasks which only start
/// waiting after the fact (e.g. a reconnect attempt) still observe it.
#[derive(Clone, Debug)]
pub struct Shutdown {
    signal: Arc<watch::Sender<bool>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Shutdown {
            signal: Arc::new(signal),
        }
    }

    pub fn trigger(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves as soon as `trigger()` has been called, immediately if that already happened.
    pub async fn triggered(&self) {
        let mut receiver = self.signal.subscribe();
        // Sender is owned by self, so this can only return after a trigger
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_is_sticky() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        let waiter = shutdown.clone();
        let handle = tokio::spawn(async move { waiter.triggered().await });
        shutdown.trigger();

        assert!(tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .is_ok());

        // late waiters resolve right away
        assert!(
            tokio::time::timeout(Duration::from_millis(100), shutdown.triggered())
                .await
                .is_ok()
        );
        assert!(shutdown.is_triggered());
    }
}
