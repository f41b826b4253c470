/// Injected instrumentation hooks. The core never touches process-wide
/// counters; whoever wires the service decides where these land.
pub trait AuthMetrics: Send + Sync {
    fn on_login(&self) {}
    fn on_rotation(&self) {}
    fn on_reuse_detected(&self) {}
    fn on_logout(&self) {}
    fn on_authenticated(&self) {}
    fn on_rejected(&self) {}
}

pub struct NoopAuthMetrics;

impl AuthMetrics for NoopAuthMetrics {}
