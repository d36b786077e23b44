use btleplug::api::{CharPropFlags, Characteristic, WriteType};
use metrics::Label;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::inner::link::HelmetLink;
use crate::inner::metrics::{
    PAYLOADS_DROPPED, PAYLOADS_QUEUED, QUEUE_DEPTH, WRITES_COMPLETED, WRITES_DISPATCHED,
    WRITES_FAILED, WRITES_REJECTED,
};
use crate::inner::model::link_command::frame_payload;
use crate::inner::model::transport_event::WriteId;

/// Without-response is preferred whenever the characteristic allows it.
pub(super) fn select_write_type(characteristic: &Characteristic) -> WriteType {
    if characteristic
        .properties
        .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
    {
        WriteType::WithoutResponse
    } else {
        WriteType::WithResponse
    }
}

fn write_type_label(write_type: WriteType) -> Label {
    let value = match write_type {
        WriteType::WithResponse => "with_response",
        WriteType::WithoutResponse => "without_response",
    };
    Label::new("mode", value)
}

impl HelmetLink {
    pub(crate) fn send(&mut self, payload: Option<String>) {
        match payload {
            Some(payload) => self.enqueue(frame_payload(&payload)),
            None => {
                debug!("Dropping absent payload");
                PAYLOADS_DROPPED.increment();
            }
        }
    }

    pub(crate) fn enqueue(&mut self, payload: Vec<u8>) {
        if self.queue.push(payload) {
            PAYLOADS_QUEUED.increment();
        } else {
            debug!("Dropping empty payload");
            PAYLOADS_DROPPED.increment();
        }
        self.drain();
    }

    /// Dispatches queued payloads for as long as the pacer allows. Redundant calls are harmless.
    pub(crate) fn drain(&mut self) {
        while self.dispatch_next() {}
        QUEUE_DEPTH.gauge(self.queue.len() as f64);
    }

    /// Returns `true` when another dispatch may be attempted right away.
    fn dispatch_next(&mut self) -> bool {
        if self.pacer.is_busy() {
            return false;
        }
        let (Some(handle), Some(characteristic)) =
            (self.handle.as_ref(), self.characteristic.as_ref())
        else {
            return false;
        };
        let Some(payload) = self.queue.front() else {
            return false;
        };

        let now = Instant::now();
        if !self.pacer.interval_elapsed(now) {
            trace!(queued = self.queue.len(), "Minimum write interval not elapsed");
            return false;
        }

        let write_type = select_write_type(characteristic);
        let write = self.pacer.next_write_id();
        match self
            .transport
            .write_characteristic(handle, write, characteristic, payload, write_type)
        {
            Ok(()) => {
                self.queue.pop_front();
                WRITES_DISPATCHED.increment_with(1, [write_type_label(write_type)]);
                self.pacer.begin(write, now);
                match write_type {
                    WriteType::WithoutResponse => {
                        self.pacer.complete(Instant::now());
                        true
                    }
                    WriteType::WithResponse => false,
                }
            }
            Err(err) => {
                warn!(
                    ?err,
                    queued = self.queue.len(),
                    "Write rejected, payload kept at the head of the queue"
                );
                WRITES_REJECTED.increment();
                self.pacer.unblock();
                false
            }
        }
    }

    /// Completions for writes other than the one in flight were abandoned earlier and are ignored.
    pub(super) fn on_write_completed(&mut self, write: WriteId, success: bool) {
        let in_flight = self.pacer.in_flight_write();
        if in_flight != Some(write) {
            debug!(%write, ?in_flight, "Ignoring completion of a write that is not in flight");
            return;
        }
        if success {
            WRITES_COMPLETED.increment();
        } else {
            warn!("Peripheral reported a failed write");
            WRITES_FAILED.increment();
        }
        self.pacer.complete(Instant::now());
        self.drain();
    }

    pub(crate) fn on_tick(&mut self) {
        let in_flight = self.pacer.in_flight_for(Instant::now());
        if let (Some(limit), Some(in_flight)) = (self.write_watchdog, in_flight) {
            if in_flight >= limit {
                let write = self.pacer.in_flight_write();
                warn!(?write, ?in_flight, "Write was not acknowledged in time, abandoning it");
                WRITES_FAILED.increment();
                self.pacer.complete(Instant::now());
            }
        }
        self.drain();
    }
}
