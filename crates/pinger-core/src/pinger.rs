use crate::config::{defaults, Config};
use crate::error::{Error, Result};
use crate::net::{Channel, Network, SocketImpl};
use crate::probe::{ms_elapsed_since, ms_since_midnight, Probe, Reply, ReplyKind};
use crate::stats::{PingStats, ReplyDisposition, SequenceTracker};
use crate::types::{Sequence, TimeToLive};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tracing::instrument;

/// A token used to cancel a running ping.
///
/// The engine polls the token at loop boundaries, cancellation takes effect
/// within one interval or read timeout.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the run.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// An event published during a ping run.
#[derive(Debug, Clone, Copy)]
pub enum PingEvent {
    /// The first reply to a probe.
    Reply(ReplyEvent),
    /// A repeat reply to an already answered probe.
    Duplicate(ReplyEvent),
    /// An ICMP error reported for a probe.
    IcmpError(ReplyEvent),
    /// The end-of-run statistics.
    Summary(PingStats),
}

/// The details of a single validated reply.
#[derive(Debug, Clone, Copy)]
pub struct ReplyEvent {
    /// The size of the ICMP message in bytes.
    pub bytes: usize,
    /// The host which sent the reply.
    pub addr: IpAddr,
    /// The sequence number of the probe being answered.
    pub sequence: Sequence,
    /// The time-to-live or hop-limit of the reply, when known.
    pub ttl: Option<TimeToLive>,
    /// The round-trip time, when it could be measured.
    pub rtt: Option<Duration>,
    /// The kind of reply.
    pub kind: ReplyKind,
}

/// A ping probe engine.
///
/// Sends a configurable stream of ICMP probes to a single target and
/// publishes an event for each validated reply along with end-of-run
/// statistics.
///
/// # Examples
///
/// Ping `127.0.0.1` four times at the default interval:
///
/// ```no_run
/// # fn main() -> anyhow::Result<()> {
/// use pinger_core::{Builder, MaxProbes};
/// use std::net::{IpAddr, Ipv4Addr};
/// use std::num::NonZeroUsize;
///
/// let addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
/// let pinger = Builder::new(addr)
///     .count(Some(MaxProbes(NonZeroUsize::new(4).ok_or_else(|| anyhow::anyhow!("count"))?)))
///     .build()?;
/// let stats = pinger.run()?;
/// println!("{} replies", stats.received);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Pinger {
    inner: Arc<PingerInner>,
}

#[derive(Debug)]
struct PingerInner {
    config: Config,
    token: CancellationToken,
}

impl Pinger {
    /// Create a pinger for a validated configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Arc::new(PingerInner {
                config,
                token: CancellationToken::new(),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The token which cancels this pinger.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// Run the ping to completion, discarding events.
    pub fn run(&self) -> Result<PingStats> {
        self.run_with(|_| ())
    }

    /// Run the ping to completion, publishing each event.
    #[instrument(skip_all)]
    pub fn run_with<F: Fn(&PingEvent)>(&self, publish: F) -> Result<PingStats> {
        let mut channel = Channel::<SocketImpl>::connect(&self.inner.config)?;
        PingRun::new(&self.inner.config, self.inner.token.clone()).run(&mut channel, publish)
    }

    /// Run the ping on a named background thread.
    pub fn spawn(&self) -> Result<thread::JoinHandle<Result<PingStats>>> {
        let pinger = self.clone();
        thread::Builder::new()
            .name(String::from("pinger"))
            .spawn(move || pinger.run())
            .map_err(|err| Error::Other(err.to_string()))
    }
}

/// The state of a single ping run.
struct PingRun {
    config: Config,
    token: CancellationToken,
    stats: PingStats,
    tracker: SequenceTracker,
    sequence: Sequence,
}

impl PingRun {
    fn new(config: &Config, token: CancellationToken) -> Self {
        Self {
            config: *config,
            token,
            stats: PingStats::default(),
            tracker: SequenceTracker::new(),
            sequence: config.initial_sequence,
        }
    }

    fn run<N: Network, F: Fn(&PingEvent)>(
        mut self,
        network: &mut N,
        publish: F,
    ) -> Result<PingStats> {
        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        let interval = if self.config.flood {
            defaults::DEFAULT_FLOOD_INTERVAL
        } else {
            self.config.interval
        };
        for _ in 0..self.config.preload.0 {
            if self.done_sending() || self.token.is_cancelled() {
                break;
            }
            self.send_probe(network)?;
        }
        while !self.token.is_cancelled() && !self.done_sending() && !Self::expired(deadline) {
            self.send_probe(network)?;
            let wait_until = Instant::now() + interval;
            while Instant::now() < wait_until {
                if self.token.is_cancelled() || Self::expired(deadline) {
                    break;
                }
                self.process_reply(network, &publish)?;
                if self.done_sending() && self.tracker.outstanding() == 0 {
                    break;
                }
            }
            if self.done_sending() && self.tracker.outstanding() == 0 {
                break;
            }
        }
        let linger_deadline = Instant::now() + self.config.linger;
        while self.tracker.outstanding() > 0
            && Instant::now() < linger_deadline
            && !self.token.is_cancelled()
            && !Self::expired(deadline)
        {
            self.process_reply(network, &publish)?;
        }
        publish(&PingEvent::Summary(self.stats));
        Ok(self.stats)
    }

    /// Whether the configured probe count has been reached.
    fn done_sending(&self) -> bool {
        self.config
            .count
            .is_some_and(|max| self.stats.sent >= max.0.get())
    }

    fn expired(deadline: Option<Instant>) -> bool {
        deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Send the next probe.
    ///
    /// A probe which fails with a send-level ICMP error is dropped and the
    /// run continues, any other error is fatal.
    fn send_probe<N: Network>(&mut self, network: &mut N) -> Result<()> {
        let probe = Probe::new(
            self.config.probe_kind,
            self.config.identifier,
            self.sequence,
            SystemTime::now(),
        );
        match network.send_probe(probe) {
            Ok(()) => {
                self.stats.record_sent();
                self.tracker.record_sent(self.sequence);
            }
            Err(Error::ProbeFailed(err)) => {
                tracing::debug!(%err, sequence = self.sequence.0, "probe failed to send");
            }
            Err(err) => return Err(err),
        }
        self.sequence = self.sequence.next();
        Ok(())
    }

    /// Receive and account for at most one reply.
    fn process_reply<N: Network, F: Fn(&PingEvent)>(
        &mut self,
        network: &mut N,
        publish: &F,
    ) -> Result<()> {
        let Some(reply) = network.recv_reply()? else {
            return Ok(());
        };
        // echo and timestamp replies must come from the target, ICMP errors
        // come from any router on the path
        if !matches!(reply.kind, ReplyKind::IcmpError(_)) && reply.addr != self.config.target_addr
        {
            tracing::debug!(?reply, "discarded reply from unexpected source");
            return Ok(());
        }
        match self.tracker.record_reply(reply.sequence) {
            ReplyDisposition::Unknown => {
                tracing::debug!(?reply, "discarded reply for unknown sequence");
            }
            ReplyDisposition::Duplicate => {
                self.stats.record_duplicate();
                if !self.suppressed() {
                    publish(&PingEvent::Duplicate(self.reply_event(&reply)));
                }
            }
            ReplyDisposition::First => {
                if matches!(reply.kind, ReplyKind::IcmpError(_)) {
                    self.stats.record_error();
                    publish(&PingEvent::IcmpError(self.reply_event(&reply)));
                } else {
                    self.stats.record_received();
                    let event = self.reply_event(&reply);
                    if let Some(rtt) = event.rtt {
                        self.stats.record_rtt(rtt);
                    }
                    if !self.suppressed() {
                        publish(&PingEvent::Reply(event));
                    }
                }
            }
        }
        Ok(())
    }

    fn reply_event(&self, reply: &Reply) -> ReplyEvent {
        let rtt = match reply.kind {
            ReplyKind::TimestampReply(values) => Some(Duration::from_millis(u64::from(
                ms_elapsed_since(ms_since_midnight(reply.recv), values.originate),
            ))),
            ReplyKind::EchoReply | ReplyKind::IcmpError(_) => reply
                .sent
                .and_then(|sent| reply.recv.duration_since(sent).ok()),
        };
        ReplyEvent {
            bytes: reply.bytes,
            addr: reply.addr,
            sequence: reply.sequence,
            ttl: reply.ttl,
            rtt,
            kind: reply.kind,
        }
    }

    /// Per-reply events are suppressed in quiet and flood modes.
    const fn suppressed(&self) -> bool {
        self.config.quiet || self.config.flood
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::MockNetwork;
    use crate::probe::IcmpError;
    use crate::types::MaxProbes;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::num::NonZeroUsize;
    use std::sync::Mutex;

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const ROUTER: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));

    fn test_config(count: usize) -> Config {
        Config {
            target_addr: TARGET,
            count: Some(MaxProbes(NonZeroUsize::new(count).unwrap())),
            interval: Duration::from_millis(1),
            linger: Duration::from_millis(1),
            ..Default::default()
        }
    }

    /// A network which answers every probe from the given queue filler.
    fn network_with<R>(reply_for: R) -> MockNetwork
    where
        R: Fn(Probe) -> Vec<Reply> + Send + 'static,
    {
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let send_queue = queue.clone();
        let mut network = MockNetwork::new();
        network.expect_send_probe().returning(move |probe| {
            send_queue.lock().unwrap().extend(reply_for(probe));
            Ok(())
        });
        network
            .expect_recv_reply()
            .returning(move || Ok(queue.lock().unwrap().pop_front()));
        network
    }

    fn echo_reply(probe: Probe) -> Reply {
        Reply {
            recv: SystemTime::now(),
            addr: TARGET,
            sequence: probe.sequence,
            ttl: Some(TimeToLive(64)),
            bytes: 64,
            sent: Some(probe.sent),
            kind: ReplyKind::EchoReply,
        }
    }

    fn run_collecting(
        config: &Config,
        network: &mut MockNetwork,
        token: &CancellationToken,
    ) -> (PingStats, Vec<PingEvent>) {
        let events = RefCell::new(Vec::new());
        let stats = PingRun::new(config, token.clone())
            .run(network, |event| events.borrow_mut().push(*event))
            .unwrap();
        (stats, events.into_inner())
    }

    #[test]
    fn test_run_replies() {
        let config = test_config(4);
        let mut network = network_with(|probe| vec![echo_reply(probe)]);
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(4, stats.sent);
        assert_eq!(4, stats.received);
        assert_eq!(0, stats.loss_percent());
        assert!(stats.has_rtt());
        let replies = events
            .iter()
            .filter(|event| matches!(event, PingEvent::Reply(_)))
            .count();
        assert_eq!(4, replies);
        assert!(matches!(events.last(), Some(PingEvent::Summary(_))));
    }

    #[test]
    fn test_run_unreachable() {
        let config = test_config(2);
        let mut network = network_with(|probe| {
            vec![Reply {
                recv: SystemTime::now(),
                addr: ROUTER,
                sequence: probe.sequence,
                ttl: None,
                bytes: 36,
                sent: None,
                kind: ReplyKind::IcmpError(IcmpError {
                    icmp_type: 3,
                    icmp_code: 1,
                }),
            }]
        });
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(2, stats.sent);
        assert_eq!(0, stats.received);
        assert_eq!(2, stats.errors);
        assert_eq!(100, stats.loss_percent());
        assert!(!stats.has_rtt());
        let errors = events
            .iter()
            .filter(|event| matches!(event, PingEvent::IcmpError(_)))
            .count();
        assert_eq!(2, errors);
    }

    #[test]
    fn test_run_unknown_sequence_discarded() {
        let config = test_config(1);
        let mut network = network_with(|probe| {
            vec![Reply {
                sequence: Sequence(probe.sequence.0.wrapping_add(100)),
                ..echo_reply(probe)
            }]
        });
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(1, stats.sent);
        assert_eq!(0, stats.received);
        assert_eq!(1, events.len());
        assert!(matches!(events[0], PingEvent::Summary(_)));
    }

    #[test]
    fn test_run_wrong_source_discarded() {
        let config = test_config(1);
        let mut network = network_with(|probe| {
            vec![Reply {
                addr: ROUTER,
                ..echo_reply(probe)
            }]
        });
        let (stats, _) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(1, stats.sent);
        assert_eq!(0, stats.received);
    }

    #[test]
    fn test_run_duplicates() {
        let config = test_config(1);
        let mut network = network_with(|probe| vec![echo_reply(probe), echo_reply(probe)]);
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(1, stats.received);
        assert_eq!(1, stats.duplicates);
        let duplicates = events
            .iter()
            .filter(|event| matches!(event, PingEvent::Duplicate(_)))
            .count();
        assert_eq!(1, duplicates);
    }

    #[test]
    fn test_run_quiet_suppresses_replies() {
        let config = Config {
            quiet: true,
            ..test_config(2)
        };
        let mut network = network_with(|probe| vec![echo_reply(probe)]);
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(2, stats.received);
        assert_eq!(1, events.len());
        assert!(matches!(events[0], PingEvent::Summary(_)));
    }

    #[test]
    fn test_run_preload_sends_burst_first() {
        let config = Config {
            preload: crate::types::Preload(2),
            ..test_config(3)
        };
        let ops = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(VecDeque::new()));
        let mut network = MockNetwork::new();
        let send_ops = ops.clone();
        let send_queue = queue.clone();
        network.expect_send_probe().returning(move |probe| {
            send_ops.lock().unwrap().push("send");
            send_queue.lock().unwrap().push_back(echo_reply(probe));
            Ok(())
        });
        let recv_ops = ops.clone();
        let recv_queue = queue.clone();
        network.expect_recv_reply().returning(move || {
            recv_ops.lock().unwrap().push("recv");
            Ok(recv_queue.lock().unwrap().pop_front())
        });
        let (stats, _) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(3, stats.sent);
        assert_eq!(3, stats.received);
        // the preload burst and the first paced probe all go out before any
        // receive cycle
        let ops = ops.lock().unwrap();
        assert_eq!(["send", "send", "send"], ops[..3]);
    }

    #[test]
    fn test_run_flood_suppresses_replies() {
        let config = Config {
            flood: true,
            ..test_config(3)
        };
        let mut network = network_with(|probe| vec![echo_reply(probe)]);
        let (stats, events) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(3, stats.sent);
        assert_eq!(3, stats.received);
        assert_eq!(0, stats.loss_percent());
        assert_eq!(1, events.len());
        assert!(matches!(events[0], PingEvent::Summary(_)));
    }

    #[test]
    fn test_cancelled_before_run() {
        let config = test_config(4);
        let mut network = network_with(|probe| vec![echo_reply(probe)]);
        let token = CancellationToken::new();
        token.cancel();
        let (stats, events) = run_collecting(&config, &mut network, &token);
        assert_eq!(0, stats.sent);
        assert_eq!(1, events.len());
        assert!(matches!(events[0], PingEvent::Summary(_)));
    }

    #[test]
    fn test_probe_failed_is_not_fatal() {
        let config = test_config(1);
        let mut network = MockNetwork::new();
        network.expect_send_probe().returning(|_| {
            Err(Error::ProbeFailed(crate::error::IoError::SendTo(
                std::io::Error::from(crate::error::ErrorKind::HostUnreachable),
                std::net::SocketAddr::new(TARGET, 0),
            )))
        });
        network.expect_recv_reply().returning(|| Ok(None));
        let config = Config {
            timeout: Some(Duration::from_millis(5)),
            ..config
        };
        let (stats, _) = run_collecting(&config, &mut network, &CancellationToken::new());
        assert_eq!(0, stats.sent);
        assert_eq!(0, stats.received);
    }
}
