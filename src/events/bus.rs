// src/events/bus.rs

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use uuid::Uuid;

use super::payloads::{
    AgentTaskCompleted, AgentTaskCreated, DataProcessed, DataUploaded, Notification,
};

// Capacidade do canal de observação (tap); observadores lentos perdem eventos antigos
const TAP_CAPACITY: usize = 256;

/// Um evento em trânsito. O `id` é estável entre reentregas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub id: Uuid,
    pub published_at: DateTime<Utc>,
    pub attempt: u32,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: Uuid::new_v4(),
            published_at: Utc::now(),
            attempt: 1,
            payload,
        }
    }
}

/// Consumidor de um tópico. Retornar `Err` pede reentrega.
/// Como a entrega é "pelo menos uma vez", toda implementação precisa ser idempotente.
#[async_trait]
pub trait EventHandler<T>: Send + Sync + 'static
where
    T: Send + Sync + 'static,
{
    /// Nome da assinatura; aparece nos logs e identifica o consumidor nos recibos.
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &Envelope<T>) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    /// Total de tentativas, contando a primeira.
    pub max_deliveries: u32,
    /// Passo do recuo linear: espera `backoff * tentativa` antes de reenviar.
    pub backoff: Duration,
}

impl Default for DeliveryPolicy {
    fn default() -> Self {
        Self {
            max_deliveries: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

#[derive(Clone)]
struct Runtime {
    policy: DeliveryPolicy,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

pub struct Topic<T> {
    name: &'static str,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Envelope<T>>>>,
    taps: broadcast::Sender<Envelope<T>>,
    runtime: Runtime,
}

impl<T> Topic<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new(name: &'static str, runtime: Runtime) -> Self {
        let (taps, _) = broadcast::channel(TAP_CAPACITY);
        Self {
            name,
            subscribers: Mutex::new(Vec::new()),
            taps,
            runtime,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Publica um evento novo e devolve o id do envelope.
    pub fn publish(&self, payload: T) -> Uuid {
        let envelope = Envelope::new(payload);
        let id = envelope.id;
        self.publish_envelope(envelope);
        id
    }

    /// Entrega um envelope já existente (mesmo id) a todas as assinaturas.
    pub fn publish_envelope(&self, envelope: Envelope<T>) {
        {
            let mut subscribers = self.subscribers.lock().unwrap_or_else(PoisonError::into_inner);
            // Dispatchers encerrados fecham o receptor; saem da lista aqui
            subscribers.retain(|tx| tx.send(envelope.clone()).is_ok());
        }

        tracing::debug!(topic = self.name, event_id = %envelope.id, "evento publicado");

        // Sem observadores é o caso normal
        let _ = self.taps.send(envelope);
    }

    /// Observa tudo o que for publicado a partir de agora (logs e testes).
    pub fn tap(&self) -> broadcast::Receiver<Envelope<T>> {
        self.taps.subscribe()
    }

    /// Registra uma assinatura. Cada uma tem fila própria e um dispatcher que
    /// dispara uma task por entrega: entregas concorrentes, sem ordem garantida.
    pub fn subscribe(&self, handler: Arc<dyn EventHandler<T>>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope<T>>();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);

        let runtime = self.runtime.clone();
        let topic = self.name;

        tracing::info!(topic, subscription = handler.name(), "📬 Assinatura registrada");

        self.runtime.tracker.spawn(async move {
            loop {
                tokio::select! {
                    _ = runtime.cancel.cancelled() => break,
                    next = rx.recv() => match next {
                        Some(envelope) => {
                            runtime.tracker.spawn(deliver(
                                topic,
                                handler.clone(),
                                envelope,
                                runtime.policy,
                                runtime.cancel.clone(),
                            ));
                        }
                        None => break,
                    }
                }
            }
            tracing::debug!(topic, subscription = handler.name(), "dispatcher encerrado");
        });
    }
}

async fn deliver<T>(
    topic: &'static str,
    handler: Arc<dyn EventHandler<T>>,
    mut envelope: Envelope<T>,
    policy: DeliveryPolicy,
    cancel: CancellationToken,
) where
    T: Send + Sync + 'static,
{
    loop {
        match handler.handle(&envelope).await {
            Ok(()) => return,
            Err(e) if envelope.attempt < policy.max_deliveries => {
                tracing::warn!(
                    topic,
                    subscription = handler.name(),
                    event_id = %envelope.id,
                    attempt = envelope.attempt,
                    "falha na entrega, reenviando: {:#}",
                    e
                );

                let wait = policy.backoff * envelope.attempt;
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(wait) => {}
                }
                envelope.attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    topic,
                    subscription = handler.name(),
                    event_id = %envelope.id,
                    attempt = envelope.attempt,
                    "entrega abandonada: {:#}",
                    e
                );
                return;
            }
        }
    }
}

struct Topics {
    data_uploaded: Topic<DataUploaded>,
    data_processed: Topic<DataProcessed>,
    agent_task_created: Topic<AgentTaskCreated>,
    agent_task_completed: Topic<AgentTaskCompleted>,
    notification: Topic<Notification>,
    runtime: Runtime,
}

/// Barramento de eventos em processo, com os cinco tópicos do sistema.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Topics>,
}

impl EventBus {
    pub fn new(policy: DeliveryPolicy) -> Self {
        let runtime = Runtime {
            policy,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
        };

        Self {
            inner: Arc::new(Topics {
                data_uploaded: Topic::new("data-uploaded", runtime.clone()),
                data_processed: Topic::new("data-processed", runtime.clone()),
                agent_task_created: Topic::new("agent-task-created", runtime.clone()),
                agent_task_completed: Topic::new("agent-task-completed", runtime.clone()),
                notification: Topic::new("notification", runtime.clone()),
                runtime,
            }),
        }
    }

    pub fn data_uploaded(&self) -> &Topic<DataUploaded> {
        &self.inner.data_uploaded
    }

    pub fn data_processed(&self) -> &Topic<DataProcessed> {
        &self.inner.data_processed
    }

    pub fn agent_task_created(&self) -> &Topic<AgentTaskCreated> {
        &self.inner.agent_task_created
    }

    pub fn agent_task_completed(&self) -> &Topic<AgentTaskCompleted> {
        &self.inner.agent_task_completed
    }

    pub fn notification(&self) -> &Topic<Notification> {
        &self.inner.notification
    }

    /// Token cancelado no desligamento; consumidores longos devem observá-lo.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.runtime.cancel.clone()
    }

    /// Para os dispatchers e espera as entregas em andamento terminarem.
    pub async fn shutdown(&self) {
        let runtime = &self.inner.runtime;
        runtime.cancel.cancel();
        runtime.tracker.close();
        runtime.tracker.wait().await;
        tracing::info!("🛑 Barramento de eventos encerrado");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::electoral::DataType;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> DeliveryPolicy {
        DeliveryPolicy {
            max_deliveries: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn processed(records: u64) -> DataProcessed {
        DataProcessed {
            tenant_id: Uuid::new_v4(),
            data_type: DataType::Elections,
            records_processed: records,
            success: true,
            errors: None,
        }
    }

    /// Repassa cada tentativa para o teste e falha as `fail_first` primeiras.
    struct Probe {
        seen: mpsc::UnboundedSender<(Uuid, u32)>,
        fail_first: u32,
        calls: AtomicU32,
    }

    impl Probe {
        fn new(fail_first: u32) -> (Arc<Self>, mpsc::UnboundedReceiver<(Uuid, u32)>) {
            let (seen, rx) = mpsc::unbounded_channel();
            let probe = Arc::new(Self {
                seen,
                fail_first,
                calls: AtomicU32::new(0),
            });
            (probe, rx)
        }
    }

    #[async_trait]
    impl EventHandler<DataProcessed> for Probe {
        fn name(&self) -> &'static str {
            "probe"
        }

        async fn handle(&self, event: &Envelope<DataProcessed>) -> anyhow::Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = self.seen.send((event.id, event.attempt));
            if call <= self.fail_first {
                anyhow::bail!("falha simulada {}", call);
            }
            Ok(())
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<(Uuid, u32)>) -> Option<(Uuid, u32)> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    async fn nothing_more(rx: &mut mpsc::UnboundedReceiver<(Uuid, u32)>) -> bool {
        tokio::time::timeout(Duration::from_millis(100), rx.recv())
            .await
            .is_err()
    }

    #[tokio::test]
    async fn every_subscription_receives_the_event() {
        let bus = EventBus::new(fast_policy());
        let (a, mut rx_a) = Probe::new(0);
        let (b, mut rx_b) = Probe::new(0);
        bus.data_processed().subscribe(a);
        bus.data_processed().subscribe(b);

        let id = bus.data_processed().publish(processed(3));

        assert_eq!(next(&mut rx_a).await, Some((id, 1)));
        assert_eq!(next(&mut rx_b).await, Some((id, 1)));
    }

    #[tokio::test]
    async fn failed_delivery_is_retried_with_same_id() {
        let bus = EventBus::new(fast_policy());
        let (probe, mut rx) = Probe::new(1);
        bus.data_processed().subscribe(probe);

        let id = bus.data_processed().publish(processed(1));

        assert_eq!(next(&mut rx).await, Some((id, 1)));
        assert_eq!(next(&mut rx).await, Some((id, 2)));
        assert!(nothing_more(&mut rx).await);
    }

    #[tokio::test]
    async fn gives_up_after_max_deliveries() {
        let bus = EventBus::new(fast_policy());
        let (probe, mut rx) = Probe::new(u32::MAX);
        bus.data_processed().subscribe(probe);

        bus.data_processed().publish(processed(0));

        for attempt in 1..=3 {
            assert_eq!(next(&mut rx).await.map(|(_, a)| a), Some(attempt));
        }
        assert!(nothing_more(&mut rx).await);
    }

    #[tokio::test]
    async fn tap_observes_published_envelopes() {
        let bus = EventBus::new(fast_policy());
        let mut tap = bus.data_processed().tap();

        let id = bus.data_processed().publish(processed(7));
        let seen = tap.recv().await.unwrap();

        assert_eq!(seen.id, id);
        assert_eq!(seen.payload.records_processed, 7);
    }

    #[tokio::test]
    async fn shutdown_stops_dispatching() {
        let bus = EventBus::new(fast_policy());
        let (probe, mut rx) = Probe::new(0);
        bus.data_processed().subscribe(probe);

        bus.shutdown().await;
        bus.data_processed().publish(processed(1));

        assert!(nothing_more(&mut rx).await);
    }
}
