use crate::device::{DeviceApi, DeviceError, DeviceFuture};
use crate::model::{DeviceData, TargetDuration};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Debug)]
pub(crate) enum Reply<T> {
    Value(T),
    Unavailable,
    Malformed,
    Hang,
}

impl<T: 'static> Reply<T> {
    fn resolve<'a>(self, delay: Duration) -> DeviceFuture<'a, T> {
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match self {
                Reply::Value(value) => Ok(value),
                Reply::Unavailable => Err(DeviceError::NetworkUnavailable(
                    "simulated outage".to_string(),
                )),
                Reply::Malformed => Err(DeviceError::MalformedResponse(
                    "simulated garbage".to_string(),
                )),
                Reply::Hang => std::future::pending().await,
            }
        })
    }
}

/// Scriptable stand-in for the study timer.
pub(crate) struct FakeDevice {
    calls: Mutex<Vec<&'static str>>,
    target_reply: Mutex<Reply<TargetDuration>>,
    write_reply: Mutex<Reply<()>>,
    stored_target: Mutex<Option<TargetDuration>>,
    data_replies: Mutex<VecDeque<(Duration, Reply<DeviceData>)>>,
    cancel_after_polls: Mutex<Option<(usize, CancellationToken)>>,
}

impl Default for FakeDevice {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            target_reply: Mutex::new(Reply::Unavailable),
            write_reply: Mutex::new(Reply::Value(())),
            stored_target: Mutex::new(None),
            data_replies: Mutex::new(VecDeque::new()),
            cancel_after_polls: Mutex::new(None),
        }
    }
}

impl FakeDevice {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn stored_target(&self) -> Option<TargetDuration> {
        *self.stored_target.lock().unwrap()
    }

    pub(crate) fn set_target_reply(&self, reply: Reply<TargetDuration>) {
        *self.target_reply.lock().unwrap() = reply;
    }

    pub(crate) fn set_write_reply(&self, reply: Reply<()>) {
        *self.write_reply.lock().unwrap() = reply;
    }

    /// Queues a `/data` reply; once the queue drains polls fail.
    pub(crate) fn push_data(&self, delay: Duration, reply: Reply<DeviceData>) {
        self.data_replies.lock().unwrap().push_back((delay, reply));
    }

    pub(crate) fn cancel_after_polls(&self, polls: usize, token: CancellationToken) {
        *self.cancel_after_polls.lock().unwrap() = Some((polls, token));
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl DeviceApi for FakeDevice {
    fn fetch_data(&self) -> DeviceFuture<'_, DeviceData> {
        self.record("data");
        let polls = self.calls().iter().filter(|call| **call == "data").count();
        if let Some((limit, token)) = self.cancel_after_polls.lock().unwrap().as_ref()
            && polls >= *limit
        {
            token.cancel();
        }
        let (delay, reply) = self
            .data_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Duration::ZERO, Reply::Unavailable));
        reply.resolve(delay)
    }

    fn fetch_target(&self) -> DeviceFuture<'_, TargetDuration> {
        self.record("target");
        self.target_reply.lock().unwrap().clone().resolve(Duration::ZERO)
    }

    fn set_target(&self, target: TargetDuration) -> DeviceFuture<'_, ()> {
        self.record("settarget");
        let reply = self.write_reply.lock().unwrap().clone();
        if matches!(reply, Reply::Value(())) {
            *self.stored_target.lock().unwrap() = Some(target);
        }
        reply.resolve(Duration::ZERO)
    }

    fn log_now(&self) -> DeviceFuture<'_, String> {
        self.record("lognow");
        Reply::Value("Logged".to_string()).resolve(Duration::ZERO)
    }

    fn clear_logs(&self) -> DeviceFuture<'_, String> {
        self.record("clearlogs");
        Reply::Value("Logs cleared".to_string()).resolve(Duration::ZERO)
    }

    fn upload_logs(&self, csv: Vec<u8>) -> DeviceFuture<'_, String> {
        self.record("uploadlogs");
        Reply::Value(format!("Merged {} bytes", csv.len())).resolve(Duration::ZERO)
    }
}

pub(crate) fn sample_data(pcm_total: &str) -> DeviceData {
    DeviceData {
        physics: "00:00:00".to_string(),
        chemistry: "00:00:00".to_string(),
        math: "00:00:00".to_string(),
        pcm_total: pcm_total.to_string(),
        log: Vec::new(),
    }
}
