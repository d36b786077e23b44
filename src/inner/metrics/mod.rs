use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Label, Unit,
};

pub(crate) mod measure_execution_time;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

pub(crate) struct StaticMetric {
    pub(crate) metric_name: &'static str,
    unit: Unit,
    description: &'static str,
    metric_type: MetricType,
}

impl StaticMetric {
    fn describe(&self) {
        let (name, unit, description) = (self.metric_name, self.unit, self.description);
        match self.metric_type {
            MetricType::Counter => describe_counter!(name, unit, description),
            MetricType::Gauge => describe_gauge!(name, unit, description),
            MetricType::Histogram => describe_histogram!(name, unit, description),
        }
    }

    pub(crate) fn increment(&self) {
        self.increment_with::<Label>(1, [])
    }

    pub(crate) fn increment_with<L>(&self, value: u64, labels: impl IntoIterator<Item = L>)
    where
        Label: From<L>,
    {
        debug_assert_eq!(self.metric_type, MetricType::Counter);
        let labels = labels.into_iter().map(Label::from).collect::<Vec<_>>();
        counter!(self.metric_name, labels).increment(value);
    }

    pub(crate) fn gauge(&self, value: f64) {
        debug_assert_eq!(self.metric_type, MetricType::Gauge);
        gauge!(self.metric_name).set(value);
    }

    pub(crate) fn histogram(&self, value: f64) {
        debug_assert_eq!(self.metric_type, MetricType::Histogram);
        histogram!(self.metric_name).record(value);
    }
}

pub(crate) const CONNECTIONS_STARTED: StaticMetric = StaticMetric {
    metric_name: "helmet.connection.started.count",
    unit: Unit::Count,
    description: "The number of connection attempts requested from the transport",
    metric_type: MetricType::Counter,
};

pub(crate) const CONNECTIONS_DROPPED: StaticMetric = StaticMetric {
    metric_name: "helmet.connection.dropped.count",
    unit: Unit::Count,
    description: "The number of connections reported disconnected by the transport",
    metric_type: MetricType::Counter,
};

pub(crate) const CONNECTING_ERRORS: StaticMetric = StaticMetric {
    metric_name: "helmet.connection.error.count",
    unit: Unit::Count,
    description: "The number of aborted connection attempts",
    metric_type: MetricType::Counter,
};

pub(crate) const PAYLOADS_QUEUED: StaticMetric = StaticMetric {
    metric_name: "helmet.payload.queued.count",
    unit: Unit::Count,
    description: "The number of payloads appended to the outbound queue",
    metric_type: MetricType::Counter,
};

pub(crate) const PAYLOADS_DROPPED: StaticMetric = StaticMetric {
    metric_name: "helmet.payload.dropped.count",
    unit: Unit::Count,
    description: "The number of empty or absent payloads dropped on send",
    metric_type: MetricType::Counter,
};

pub(crate) const QUEUE_DEPTH: StaticMetric = StaticMetric {
    metric_name: "helmet.queue.depth",
    unit: Unit::Count,
    description: "The number of payloads waiting for dispatch",
    metric_type: MetricType::Gauge,
};

pub(crate) const WRITES_DISPATCHED: StaticMetric = StaticMetric {
    metric_name: "helmet.write.dispatched.count",
    unit: Unit::Count,
    description: "The number of writes accepted by the transport",
    metric_type: MetricType::Counter,
};

pub(crate) const WRITES_REJECTED: StaticMetric = StaticMetric {
    metric_name: "helmet.write.rejected.count",
    unit: Unit::Count,
    description: "The number of writes rejected synchronously by the transport",
    metric_type: MetricType::Counter,
};

pub(crate) const WRITES_COMPLETED: StaticMetric = StaticMetric {
    metric_name: "helmet.write.completed.count",
    unit: Unit::Count,
    description: "The number of acknowledged writes",
    metric_type: MetricType::Counter,
};

pub(crate) const WRITES_FAILED: StaticMetric = StaticMetric {
    metric_name: "helmet.write.failed.count",
    unit: Unit::Count,
    description: "The number of writes that failed or were abandoned by the watchdog",
    metric_type: MetricType::Counter,
};

pub(crate) const CONNECTING_DURATION: StaticMetric = StaticMetric {
    metric_name: "helmet.peripheral.connecting.duration",
    unit: Unit::Milliseconds,
    description: "The time spent connecting peripheral",
    metric_type: MetricType::Histogram,
};

pub(crate) const SERVICE_DISCOVERY_DURATION: StaticMetric = StaticMetric {
    metric_name: "helmet.peripheral.discovery.duration",
    unit: Unit::Milliseconds,
    description: "The time spent discovering services",
    metric_type: MetricType::Histogram,
};

pub(crate) const WRITE_DURATION: StaticMetric = StaticMetric {
    metric_name: "helmet.peripheral.write.duration",
    unit: Unit::Milliseconds,
    description: "The time a characteristic write takes on the peripheral",
    metric_type: MetricType::Histogram,
};

pub(crate) fn describe_metrics() {
    CONNECTIONS_STARTED.describe();
    CONNECTIONS_DROPPED.describe();
    CONNECTING_ERRORS.describe();
    PAYLOADS_QUEUED.describe();
    PAYLOADS_DROPPED.describe();
    QUEUE_DEPTH.describe();
    WRITES_DISPATCHED.describe();
    WRITES_REJECTED.describe();
    WRITES_COMPLETED.describe();
    WRITES_FAILED.describe();
    CONNECTING_DURATION.describe();
    SERVICE_DISCOVERY_DURATION.describe();
    WRITE_DURATION.describe();
}
