// Copyright 2025 shoal Project Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::future::Future;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{Error, ErrorKind, Result};

type Notifier<T> = oneshot::Sender<Result<T>>;

struct Flight<T> {
    notifiers: Vec<Notifier<T>>,
}

/// Suppresses duplicate concurrent work by key.
///
/// The first caller for a key becomes the leader and evaluates its future;
/// callers that arrive while the leader is in flight wait on a latch and
/// observe the leader's outcome. Once a flight completes and its record is
/// removed, the next caller for the same key starts a new generation.
///
/// The leader's record is drained on every exit path, including a panicking
/// or cancelled leader, so one faulty load can never wedge a key. There is
/// no cancellation propagation: a hung future hangs all waiters for that
/// key until it resolves.
pub struct SingleFlight<T> {
    flights: Mutex<HashMap<String, Flight<T>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> SingleFlight<T>
where
    T: Clone,
{
    /// Run the future built by `make` under `key`, coalescing with any
    /// in-flight run for the same key.
    pub async fn flight<F, Fut>(&self, key: &str, make: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let waiter = {
            let mut flights = self.flights.lock();
            match flights.get_mut(key) {
                Some(flight) => {
                    let (tx, rx) = oneshot::channel();
                    flight.notifiers.push(tx);
                    Some(rx)
                }
                None => {
                    flights.insert(key.to_owned(), Flight { notifiers: vec![] });
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            return match rx.await {
                Ok(res) => res,
                Err(e) => Err(Error::caused_by(
                    ErrorKind::ChannelClosed,
                    "flight leader dropped",
                    e,
                )),
            };
        }

        // Leader path. The guard drains the record even if the future panics
        // or this task is dropped at the await point, failing the waiters
        // instead of wedging the key.
        let guard = FlightGuard {
            flights: &self.flights,
            key,
        };
        let res = make().await;
        guard.finish(res.clone());
        res
    }
}

struct FlightGuard<'a, T> {
    flights: &'a Mutex<HashMap<String, Flight<T>>>,
    key: &'a str,
}

impl<T> FlightGuard<'_, T>
where
    T: Clone,
{
    fn finish(self, res: Result<T>) {
        let flight = self.flights.lock().remove(self.key);
        std::mem::forget(self);
        if let Some(flight) = flight {
            for notifier in flight.notifiers {
                let _ = notifier.send(res.clone());
            }
        }
    }
}

impl<T> Drop for FlightGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(flight) = self.flights.lock().remove(self.key) {
            for notifier in flight.notifiers {
                let _ = notifier.send(Err(Error::new(
                    ErrorKind::ChannelClosed,
                    "flight leader did not complete",
                )));
            }
        }
    }
}
