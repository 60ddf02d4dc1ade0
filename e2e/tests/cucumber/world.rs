use std::{sync::mpsc::channel, thread::JoinHandle, time::Duration};

use async_nats::Subscriber;
use cucumber::World;
use log::*;
use nats_tools::{ConsumerConfig, NatsClient, NatsConfig};
use order_ingest_engine::{
    db_types::{Order, OrderUid},
    test_utils::prepare_env::{delete_order, prepare_test_db, TEST_DATABASE_URL, TEST_REDIS_ADDR},
    OrderCache,
    OrderFlowApi,
    OrderStore,
    PostgresDatabase,
    RedisConfig,
    RedisOrderCache,
};
use order_ingest_server::consumer::{nats::NatsBroker, ConsumerOptions, ConsumerState, OrderConsumer};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// How long a step waits for the gateway to catch up before giving up.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(15);

/// A gateway consumer running on its own thread and runtime.
#[derive(Debug)]
pub struct RunningConsumer {
    shutdown: CancellationToken,
    thread: Option<JoinHandle<()>>,
}

impl RunningConsumer {
    pub fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("🌍️ Consumer thread panicked");
            }
        }
    }
}

#[derive(Debug, World)]
pub struct OigWorld {
    pub database_url: String,
    pub redis: RedisConfig,
    pub nats_config: NatsConfig,
    pub consumer_config: ConsumerConfig,
    pub nats: Option<NatsClient>,
    pub db: Option<PostgresDatabase>,
    pub cache: Option<RedisOrderCache>,
    pub consumer: Option<RunningConsumer>,
    pub dead_letters: Option<Subscriber>,
    pub last_order: Option<Order>,
}

impl Default for OigWorld {
    fn default() -> Self {
        let _ = env_logger::try_init().ok();
        let database_url = std::env::var(TEST_DATABASE_URL).unwrap_or_default();
        let redis_addr = std::env::var(TEST_REDIS_ADDR).unwrap_or_else(|_| "localhost:6379".into());
        let consumer_config = ConsumerConfig {
            durable_name: "e2e-order-processors".into(),
            max_deliveries: 3,
            ack_wait: Duration::from_secs(5),
            ..Default::default()
        };
        Self {
            database_url,
            redis: RedisConfig { addr: redis_addr, ..Default::default() },
            nats_config: NatsConfig::from_env_or_default().with_name("oig-e2e"),
            consumer_config,
            nats: None,
            db: None,
            cache: None,
            consumer: None,
            dead_letters: None,
            last_order: None,
        }
    }
}

impl OigWorld {
    /// Connects the test's own handles to the backing services. These are used to publish and to inspect results,
    /// never by the consumer itself.
    pub async fn connect(&mut self) {
        let db = prepare_test_db(&self.database_url).await;
        let cache = RedisOrderCache::connect(&self.redis).await.expect("Error connecting to Redis");
        let nats = NatsClient::connect(&self.nats_config).await.expect("Error connecting to NATS");
        nats.ensure_order_stream().await.expect("Error provisioning the order stream");
        debug!("🌍️ Connected to Postgres, Redis and NATS");
        self.db = Some(db);
        self.cache = Some(cache);
        self.nats = Some(nats);
    }

    /// Starts an order consumer with its own connections on a dedicated thread, and waits until it is running.
    pub async fn start_consumer(&mut self) {
        let database_url = self.database_url.clone();
        let redis = self.redis.clone();
        let nats_config = self.nats_config.clone().with_name("oig-e2e-consumer");
        let consumer_config = self.consumer_config.clone();
        let options = ConsumerOptions {
            max_deliveries: u64::try_from(consumer_config.max_deliveries).unwrap_or(1),
            retry_backoff: Duration::from_millis(200),
            ..Default::default()
        };
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let (tx, rx) = channel::<watch::Receiver<ConsumerState>>();
        let thread = std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Error building consumer runtime");
            rt.block_on(async move {
                let db = PostgresDatabase::new_with_url(&database_url).await.expect("Error connecting to Postgres");
                let cache = RedisOrderCache::connect(&redis).await.expect("Error connecting to Redis");
                let nats = NatsClient::connect(&nats_config).await.expect("Error connecting to NATS");
                let broker = NatsBroker::new(nats, consumer_config);
                broker.provision().await.expect("Error provisioning the order stream");
                let consumer = OrderConsumer::new(broker, OrderFlowApi::new(db, cache), options);
                let _res = tx.send(consumer.state());
                match consumer.start(token).await {
                    Ok(()) => info!("🌍️ Consumer shut down"),
                    Err(e) => warn!("🌍️ Consumer error: {e}"),
                }
            });
        });
        let mut state = rx.recv().expect("Consumer thread exited before it was ready");
        tokio::time::timeout(STEP_TIMEOUT, state.wait_for(|s| *s == ConsumerState::Running))
            .await
            .expect("Consumer did not start in time")
            .expect("Consumer stopped before it was running");
        info!("🌍️ Consumer started");
        self.consumer = Some(RunningConsumer { shutdown, thread: Some(thread) });
    }

    pub fn stop_consumer(&mut self) {
        if let Some(mut consumer) = self.consumer.take() {
            info!("🌍️ Stopping consumer");
            consumer.stop();
            info!("🌍️ Consumer stopped");
        }
    }

    pub fn nats(&self) -> &NatsClient {
        self.nats.as_ref().expect("NATS not connected")
    }

    pub fn database(&self) -> &PostgresDatabase {
        self.db.as_ref().expect("Database not connected")
    }

    pub fn cache(&self) -> &RedisOrderCache {
        self.cache.as_ref().expect("Cache not connected")
    }

    /// Clears any trace of the order from previous runs.
    pub async fn forget_order(&self, order_uid: &OrderUid) {
        delete_order(self.database(), order_uid).await;
        self.cache().remove_order(order_uid).await.expect("Error clearing cache entry");
    }

    /// Polls the store until the order appears.
    pub async fn wait_for_stored_order(&self, order_uid: &OrderUid) -> Order {
        let poll = async {
            loop {
                match self.database().fetch_order(order_uid).await {
                    Ok(Some(order)) => return order,
                    Ok(None) => trace!("🌍️ {order_uid} is not stored yet"),
                    Err(e) => warn!("🌍️ Error fetching {order_uid}: {e}"),
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(STEP_TIMEOUT, poll).await.expect("Order was not stored in time")
    }

    /// Polls the cache until the order appears.
    pub async fn wait_for_cached_order(&self, order_uid: &OrderUid) -> Order {
        let poll = async {
            loop {
                match self.cache().fetch_order(order_uid).await {
                    Ok(Some(order)) => return order,
                    Ok(None) => trace!("🌍️ {order_uid} is not cached yet"),
                    Err(e) => warn!("🌍️ Error reading {order_uid} from the cache: {e}"),
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        };
        tokio::time::timeout(STEP_TIMEOUT, poll).await.expect("Order was not cached in time")
    }
}
