pub mod clock;
pub mod consumer_loop;
pub mod coordinator;
pub mod events;
pub mod local_store;
pub mod outcome;
pub mod rule_evaluator;
pub mod sink;
pub mod submitter;
pub mod tenant_context;

pub use clock::{Clock, FixedClock, SystemClock};
pub use consumer_loop::{ConsumerLoop, ReadinessHandle};
pub use coordinator::Coordinator;
pub use events::{EventBus, StorageEvent};
pub use local_store::{Core, CoreConfig, DEFAULT_WRITE_TIMEOUT};
pub use outcome::ApplyOutcome;
pub use rule_evaluator::{FakeRuleEvaluator, NoopRuleEvaluator, RuleEvaluator};
pub use sink::Sink;
pub use submitter::Submitter;
pub use tenant_context::{FixedTenantContext, TenantContext};

use std::sync::Arc;

use registry_journal::JournalProducer;
use registry_store::PgStore;

/// Everything a node needs to start serving (§4.J): the request-facing facade
/// and the background task that feeds it from the journal. Assembling these
/// by hand rather than behind one constructor would let the two drift apart —
/// e.g. a `Core` built against a `Coordinator` the Consumer Loop never writes
/// into — so `build_engine` is the only supported way to get either.
pub struct Engine {
    pub core: Core,
    pub consumer_loop: Arc<ConsumerLoop>,
}

/// Wires a `PgStore` and journal producer into a matched `Core` + `ConsumerLoop`
/// pair sharing one `Coordinator` and one `EventBus`. The caller is responsible
/// for obtaining a `JournalConsumer` (from the same journal backend as
/// `producer`) and driving `engine.consumer_loop.run(consumer)` as a background
/// task (§4.H).
pub fn build_engine(
    store: PgStore,
    producer: Arc<dyn JournalProducer>,
    clock: Arc<dyn Clock>,
    rule_evaluator: Arc<dyn RuleEvaluator>,
    config: CoreConfig,
) -> Engine {
    let coordinator = Arc::new(Coordinator::new());
    let events = EventBus::default();

    let submitter = Arc::new(Submitter::new(producer.clone(), coordinator.clone()));
    let sink = Arc::new(Sink::new(
        store.clone(),
        coordinator.clone(),
        events.clone(),
        config.reference_strictness,
    ));
    let consumer_loop = Arc::new(ConsumerLoop::new(producer, sink, events));

    let core = Core::new(store, submitter, coordinator, clock, rule_evaluator, config);

    Engine { core, consumer_loop }
}
