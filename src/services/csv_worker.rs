// src/services/csv_worker.rs

use std::{borrow::Cow, str::FromStr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    db::{ElectoralStore, ReceiptStore},
    events::{DataProcessed, DataUploaded, Envelope, EventBus, EventHandler},
    models::electoral::{DataType, ElectionRow, IbgeRow, PollRow},
    storage::ObjectStore,
};

pub const CONSUMER: &str = "process-uploaded-data";

#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRow {
    Election(ElectionRow),
    Ibge(IbgeRow),
    Poll(PollRow),
}

/// Linhas de dados de um CSV: o cabeçalho é sempre descartado, `\r` final removido,
/// linhas em branco ignoradas.
pub fn data_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .skip(1)
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
}

/// Colunas posicionais, sem aspas. Cada campo é aparado.
struct Fields<'a> {
    values: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn split(line: &'a str) -> Self {
        Self {
            values: line.split(',').map(str::trim).collect(),
        }
    }

    fn text(&self, index: usize, column: &str) -> Result<String, String> {
        self.values
            .get(index)
            .map(|v| v.to_string())
            .ok_or_else(|| format!("missing column '{}'", column))
    }

    fn int<T: FromStr>(&self, index: usize, column: &str) -> Result<T, String> {
        let raw = self.text(index, column)?;
        raw.parse::<T>()
            .map_err(|_| format!("invalid integer for '{}': '{}'", column, raw))
    }

    fn decimal(&self, index: usize, column: &str) -> Result<f64, String> {
        let raw = self.text(index, column)?;
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid number for '{}': '{}'", column, raw))
    }

    fn date(&self, index: usize, column: &str) -> Result<NaiveDate, String> {
        let raw = self.text(index, column)?;
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map_err(|_| format!("invalid date for '{}': '{}'", column, raw))
    }
}

/// Converte uma linha de dados no registro do tipo correspondente.
/// Coerção estrita: vazio, malformado ou não finito rejeita a linha.
pub fn parse_line(data_type: DataType, line: &str) -> Result<ParsedRow, String> {
    let f = Fields::split(line);

    let row = match data_type {
        DataType::Elections => ParsedRow::Election(ElectionRow {
            zone: f.text(0, "zone")?,
            section: f.text(1, "section")?,
            candidate_name: f.text(2, "candidate_name")?,
            party: f.text(3, "party")?,
            votes: f.int(4, "votes")?,
            percentage: f.decimal(5, "percentage")?,
            election_type: f.text(6, "election_type")?,
            year: f.int(7, "year")?,
        }),
        DataType::Ibge => ParsedRow::Ibge(IbgeRow {
            zone: f.text(0, "zone")?,
            neighborhood: f.text(1, "neighborhood")?,
            population: f.int(2, "population")?,
            age_0_17: f.int(3, "age_0_17")?,
            age_18_24: f.int(4, "age_18_24")?,
            age_25_34: f.int(5, "age_25_34")?,
            age_35_44: f.int(6, "age_35_44")?,
            age_45_54: f.int(7, "age_45_54")?,
            age_55_64: f.int(8, "age_55_64")?,
            age_65_plus: f.int(9, "age_65_plus")?,
            income_0_2: f.int(10, "income_0_2")?,
            income_2_5: f.int(11, "income_2_5")?,
            income_5_10: f.int(12, "income_5_10")?,
            income_10_plus: f.int(13, "income_10_plus")?,
            education_fundamental: f.int(14, "education_fundamental")?,
            education_medio: f.int(15, "education_medio")?,
            education_superior: f.int(16, "education_superior")?,
        }),
        DataType::Polls => ParsedRow::Poll(PollRow {
            poll_name: f.text(0, "poll_name")?,
            date_conducted: f.date(1, "date_conducted")?,
            sample_size: f.int(2, "sample_size")?,
            candidate_name: f.text(3, "candidate_name")?,
            intention_percentage: f.decimal(4, "intention_percentage")?,
            rejection_percentage: f.decimal(5, "rejection_percentage")?,
            confidence_level: f.decimal(6, "confidence_level")?,
            margin_error: f.decimal(7, "margin_error")?,
            methodology: f.text(8, "methodology")?,
        }),
    };

    Ok(row)
}

/// Consumidor de `DataUploaded`: baixa o CSV, grava linha a linha e publica `DataProcessed`.
pub struct CsvWorker {
    electoral: Arc<dyn ElectoralStore>,
    receipts: Arc<dyn ReceiptStore>,
    uploads: Arc<dyn ObjectStore>,
    bus: EventBus,
}

impl CsvWorker {
    pub fn new(
        electoral: Arc<dyn ElectoralStore>,
        receipts: Arc<dyn ReceiptStore>,
        uploads: Arc<dyn ObjectStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            electoral,
            receipts,
            uploads,
            bus,
        }
    }

    async fn download(&self, file_path: &str) -> anyhow::Result<String> {
        let bytes = self
            .uploads
            .get(file_path)
            .await
            .with_context(|| format!("falha ao baixar {}", file_path))?;

        // Exportações em Latin-1 são comuns: bytes inválidos viram U+FFFD e só
        // a própria linha pode falhar depois, na coerção.
        Ok(match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(text) => text.to_string(),
            Cow::Owned(text) => {
                tracing::warn!(file = %file_path, "arquivo com bytes fora do UTF-8, decodificado com substituição");
                text
            }
        })
    }

    async fn insert(&self, tenant_id: Uuid, event_id: Uuid, row: &ParsedRow) -> anyhow::Result<()> {
        match row {
            ParsedRow::Election(r) => self.electoral.insert_election(tenant_id, event_id, r).await?,
            ParsedRow::Ibge(r) => self.electoral.insert_ibge(tenant_id, event_id, r).await?,
            ParsedRow::Poll(r) => self.electoral.insert_poll(tenant_id, event_id, r).await?,
        }
        Ok(())
    }
}

#[async_trait]
impl EventHandler<DataUploaded> for CsvWorker {
    fn name(&self) -> &'static str {
        CONSUMER
    }

    async fn handle(&self, event: &Envelope<DataUploaded>) -> anyhow::Result<()> {
        let upload = &event.payload;

        // Recibo primeiro: reentregas do mesmo evento não duplicam linhas
        if !self.receipts.claim(CONSUMER, event.id).await? {
            tracing::info!(event_id = %event.id, "evento já processado, ignorando reentrega");
            return Ok(());
        }

        tracing::info!(
            event_id = %event.id,
            tenant_id = %upload.tenant_id,
            data_type = %upload.data_type,
            file = %upload.file_path,
            "📥 Processando arquivo enviado"
        );

        let content = match self.download(&upload.file_path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(event_id = %event.id, "falha antes do processamento: {:#}", e);
                self.bus.data_processed().publish(DataProcessed {
                    tenant_id: upload.tenant_id,
                    data_type: upload.data_type,
                    records_processed: 0,
                    success: false,
                    errors: Some(vec![format!("Processing error: {:#}", e)]),
                });
                return Ok(());
            }
        };

        let mut records_processed: u64 = 0;
        let mut errors: Vec<String> = Vec::new();

        for line in data_lines(&content) {
            let outcome = match parse_line(upload.data_type, line) {
                Ok(row) => self
                    .insert(upload.tenant_id, event.id, &row)
                    .await
                    .map_err(|e| format!("{:#}", e)),
                Err(reason) => Err(reason),
            };

            match outcome {
                Ok(()) => records_processed += 1,
                Err(reason) => errors.push(format!("Error processing line: {} - {}", line, reason)),
            }
        }

        tracing::info!(
            event_id = %event.id,
            tenant_id = %upload.tenant_id,
            records_processed,
            errors = errors.len(),
            "✅ Arquivo processado"
        );

        self.bus.data_processed().publish(DataProcessed {
            tenant_id: upload.tenant_id,
            data_type: upload.data_type,
            records_processed,
            success: errors.is_empty(),
            errors: (!errors.is_empty()).then_some(errors),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::MemoryStore,
        events::DeliveryPolicy,
        storage::MemoryObjectStore,
    };
    use std::time::Duration;

    const ELECTIONS: &str = "zone,section,candidate,party,votes,pct,type,year\r\n\
        001,10,Maria,ABC,120,12.5,municipal,2020\r\n\
        001,11,Maria,ABC,80,8.0,municipal,2020\r\n\
        \r\n\
        002,12,Maria,ABC,muitos,5.0,municipal,2020\r\n\
        002,13,Maria,ABC,100,10.0,municipal,2020\r\n";

    struct Harness {
        store: Arc<MemoryStore>,
        uploads: Arc<MemoryObjectStore>,
        bus: EventBus,
        worker: CsvWorker,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let uploads = Arc::new(MemoryObjectStore::default());
        let bus = EventBus::new(DeliveryPolicy::default());
        let worker = CsvWorker::new(store.clone(), store.clone(), uploads.clone(), bus.clone());
        Harness {
            store,
            uploads,
            bus,
            worker,
        }
    }

    fn uploaded(tenant_id: Uuid, path: &str) -> Envelope<DataUploaded> {
        uploaded_as(tenant_id, DataType::Elections, path)
    }

    fn uploaded_as(tenant_id: Uuid, data_type: DataType, path: &str) -> Envelope<DataUploaded> {
        Envelope::new(DataUploaded {
            tenant_id,
            data_type,
            file_name: "dados.csv".into(),
            file_path: path.into(),
            uploaded_by: "maria@campanha.com".into(),
        })
    }

    async fn processed(rx: &mut tokio::sync::broadcast::Receiver<Envelope<DataProcessed>>) -> DataProcessed {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap()
            .payload
    }

    #[test]
    fn header_and_blank_lines_are_skipped() {
        let lines: Vec<&str> = data_lines("a,b\r\n1,2\r\n\n  \n3,4").collect();
        assert_eq!(lines, vec!["1,2", "3,4"]);
    }

    #[test]
    fn numeric_coercion_is_strict() {
        assert!(parse_line(DataType::Elections, "1,2,X,P,,1.0,t,2020").is_err());
        assert!(parse_line(DataType::Elections, "1,2,X,P,10,NaN,t,2020").is_err());
        assert!(parse_line(DataType::Elections, "1,2,X,P,10,1.0").is_err());
        assert!(parse_line(DataType::Elections, "1,2,X,P,10,inf,t,2020").is_err());
        assert!(parse_line(DataType::Polls, "Ibope,2024-08-01,1000,Maria,-infinity,20,95,2,tel").is_err());
        assert!(parse_line(DataType::Ibge, "001,Centro,5000,1,2,3").is_err());

        let short = parse_line(DataType::Polls, "Ibope,2024-08-01,1000").unwrap_err();
        assert!(short.contains("missing column 'candidate_name'"), "{}", short);

        let poll = parse_line(
            DataType::Polls,
            "Datafolha, 2024-08-01 ,1200,Maria,42.5,20.1,95,2.5,presencial",
        )
        .unwrap();
        match poll {
            ParsedRow::Poll(p) => {
                assert_eq!(p.date_conducted, NaiveDate::from_ymd_opt(2024, 8, 1).unwrap());
                assert_eq!(p.intention_percentage, 42.5);
            }
            other => panic!("esperava pesquisa, veio {:?}", other),
        }
    }

    #[tokio::test]
    async fn bad_line_is_reported_and_the_rest_is_stored() {
        let h = harness();
        let tenant_id = Uuid::new_v4();
        h.uploads
            .put("elections/t/votos.csv", ELECTIONS.as_bytes().to_vec(), "text/csv")
            .await
            .unwrap();
        let mut rx = h.bus.data_processed().tap();

        h.worker.handle(&uploaded(tenant_id, "elections/t/votos.csv")).await.unwrap();

        let result = processed(&mut rx).await;
        assert_eq!(result.records_processed, 3);
        assert!(!result.success);
        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error processing line: 002,12,Maria,ABC,muitos"));

        let stats = h.store.vote_stats(tenant_id).await.unwrap();
        assert_eq!(stats.total_votes, 300);
    }

    #[tokio::test]
    async fn redelivery_does_not_duplicate_rows() {
        let h = harness();
        let tenant_id = Uuid::new_v4();
        h.uploads
            .put("elections/t/votos.csv", ELECTIONS.as_bytes().to_vec(), "text/csv")
            .await
            .unwrap();
        let event = uploaded(tenant_id, "elections/t/votos.csv");

        h.worker.handle(&event).await.unwrap();
        h.worker.handle(&event).await.unwrap();

        assert_eq!(h.store.vote_stats(tenant_id).await.unwrap().total_votes, 300);
    }

    #[tokio::test]
    async fn missing_blob_publishes_failure() {
        let h = harness();
        let mut rx = h.bus.data_processed().tap();

        h.worker
            .handle(&uploaded(Uuid::new_v4(), "elections/t/sumiu.csv"))
            .await
            .unwrap();

        let result = processed(&mut rx).await;
        assert_eq!(result.records_processed, 0);
        assert!(!result.success);
        assert!(result.errors.unwrap()[0].starts_with("Processing error:"));
    }

    #[tokio::test]
    async fn latin1_bytes_only_affect_their_own_line() {
        let h = harness();
        let tenant_id = Uuid::new_v4();
        let mut csv = b"zone,section,candidate,party,votes,pct,type,year\n".to_vec();
        csv.extend_from_slice(b"001,10,Maria,ABC,120,12.5,municipal,2020\n");
        csv.extend_from_slice(b"001,11,Jo\xE3o,XYZ,80,8.0,municipal,2020\n");
        csv.extend_from_slice(b"002,12,Maria,ABC,100,10.0,municipal,2020\n");
        h.uploads.put("elections/t/latin1.csv", csv, "text/csv").await.unwrap();
        let mut rx = h.bus.data_processed().tap();

        h.worker.handle(&uploaded(tenant_id, "elections/t/latin1.csv")).await.unwrap();

        let result = processed(&mut rx).await;
        assert_eq!(result.records_processed, 3);
        assert!(result.success);
        assert!(result.errors.is_none());
        assert_eq!(h.store.vote_stats(tenant_id).await.unwrap().total_votes, 300);
    }

    #[tokio::test]
    async fn ibge_rows_feed_the_zone_demographics() {
        let h = harness();
        let tenant_id = Uuid::new_v4();
        h.store
            .insert_election(
                tenant_id,
                Uuid::new_v4(),
                &ElectionRow {
                    zone: "001".into(),
                    section: "10".into(),
                    candidate_name: "Maria".into(),
                    party: "ABC".into(),
                    votes: 50,
                    percentage: 5.0,
                    election_type: "municipal".into(),
                    year: 2020,
                },
            )
            .await
            .unwrap();

        let csv = "zone,neighborhood,population,a,b,c,d,e,f,g,i1,i2,i3,i4,e1,e2,e3\n\
                   001,Centro,5000,1000,600,900,800,700,600,400,2000,1500,1000,500,2000,2000,1000\n\
                   002,Ribeira,abc,1,1,1,1,1,1,1,1,1,1,1,1,1,1\n\
                   003,Norte,800\n";
        h.uploads.put("ibge/t/censo.csv", csv.as_bytes().to_vec(), "text/csv").await.unwrap();
        let mut rx = h.bus.data_processed().tap();

        h.worker
            .handle(&uploaded_as(tenant_id, DataType::Ibge, "ibge/t/censo.csv"))
            .await
            .unwrap();

        let result = processed(&mut rx).await;
        assert_eq!(result.data_type, DataType::Ibge);
        assert_eq!(result.records_processed, 1);
        let errors = result.errors.unwrap();
        assert_eq!(errors.len(), 2);
        assert!(errors[1].contains("missing column 'age_0_17'"), "{}", errors[1]);

        let zones = h.store.zones(tenant_id).await.unwrap();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].population, 5000);
        assert_eq!(zones[0].age_18_24, 600);
        assert_eq!(zones[0].education_superior, 1000);

        assert!(h.store.zones(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn poll_rows_feed_the_rating() {
        let h = harness();
        let tenant_id = Uuid::new_v4();
        let csv = "poll_name,date,sample,candidate,intention,rejection,confidence,margin,method\n\
                   Datafolha,2024-06-10,1200,Maria,30.0,20.0,95,3.0,presencial\n\
                   Ibope,2024-07-05,1000,Maria,40.0,21.0,95,3.0,telefone\n\
                   Quaest,2024-07-28,1500,Maria,NaN,20.5,95,2.5,presencial\n";
        h.uploads.put("polls/t/pesquisas.csv", csv.as_bytes().to_vec(), "text/csv").await.unwrap();
        let mut rx = h.bus.data_processed().tap();

        h.worker
            .handle(&uploaded_as(tenant_id, DataType::Polls, "polls/t/pesquisas.csv"))
            .await
            .unwrap();

        let result = processed(&mut rx).await;
        assert_eq!(result.records_processed, 2);
        assert!(!result.success);
        assert!(result.errors.unwrap()[0].contains("Quaest"));

        assert_eq!(h.store.poll_rating(tenant_id, 5).await.unwrap(), 35.0);
        assert_eq!(h.store.poll_rating(Uuid::new_v4(), 5).await.unwrap(), 0.0);
    }
}
