use std::rc::Rc;

use futures::executor::block_on;
use kate_panel_wasm::application::HistoryLedger;
use kate_panel_wasm::domain::history::{AppendOutcome, HistoryEntry, HistoryLog};
use kate_panel_wasm::domain::panel::{PanelConfig, PanelFields, StorageKey};
use kate_panel_wasm::domain::pricing::Mode;
use kate_panel_wasm::infrastructure::storage::{MemoryBackend, PersistentStore};

fn ledger() -> (HistoryLedger<MemoryBackend>, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = Rc::new(PersistentStore::new(backend.clone()));
    (HistoryLedger::new(store, &PanelConfig::default()), backend)
}

fn priced(cost: &str, price: &str) -> PanelFields {
    PanelFields::new(cost, price, "", "")
}

#[test]
fn consecutive_duplicates_are_skipped() {
    block_on(async {
        let (ledger, _) = ledger();

        assert_eq!(ledger.append(Mode::Margin, &priced("10", "20")).await, AppendOutcome::Inserted);
        assert_eq!(ledger.append(Mode::Margin, &priced("10", "20.004")).await, AppendOutcome::Duplicate);
        assert_eq!(ledger.list().await.len(), 1);

        assert_eq!(ledger.append(Mode::Markup, &priced("10", "20")).await, AppendOutcome::Inserted);
        assert_eq!(ledger.append(Mode::Markup, &priced("10", "20.01")).await, AppendOutcome::Inserted);
        assert_eq!(ledger.list().await.len(), 3);
    });
}

#[test]
fn only_the_head_is_compared() {
    block_on(async {
        let (ledger, _) = ledger();
        ledger.append(Mode::Margin, &priced("10", "20")).await;
        ledger.append(Mode::Margin, &priced("10", "30")).await;

        assert_eq!(ledger.append(Mode::Margin, &priced("10", "20")).await, AppendOutcome::Inserted);
    });
}

#[test]
fn keeps_twenty_newest() {
    block_on(async {
        let (ledger, _) = ledger();
        for cost in 1..=25 {
            ledger.append(Mode::Margin, &priced(&cost.to_string(), "100")).await;
        }

        let entries = ledger.list().await;
        assert_eq!(entries.len(), 20);
        assert_eq!(entries[0].cost, Some(25.0));
        assert_eq!(entries[19].cost, Some(6.0));
    });
}

#[test]
fn capture_rounds_and_derives_percentages() {
    block_on(async {
        let (ledger, _) = ledger();
        ledger.append(Mode::Markup, &priced("10,004", "12.499")).await;

        let entry = ledger.get(0).await.expect("entry");
        assert_eq!(entry.mode, Mode::Markup);
        assert_eq!(entry.cost, Some(10.0));
        assert_eq!(entry.price, Some(12.5));
        assert_eq!(entry.margin, Some(20.0));
        assert_eq!(entry.markup, Some(24.9));
    });
}

#[test]
fn unusable_fields_are_rejected_without_writing() {
    block_on(async {
        let (ledger, backend) = ledger();

        assert_eq!(ledger.append(Mode::Margin, &priced("", "20")).await, AppendOutcome::Rejected);
        assert_eq!(ledger.append(Mode::Margin, &priced("10", "0")).await, AppendOutcome::Rejected);
        assert_eq!(ledger.append(Mode::Margin, &priced("10", "-3")).await, AppendOutcome::Rejected);
        assert!(backend.record(StorageKey::History).is_none());
        assert!(ledger.list().await.is_empty());
    });
}

#[test]
fn remove_by_index() {
    block_on(async {
        let (ledger, _) = ledger();
        for cost in ["1", "2", "3"] {
            ledger.append(Mode::Margin, &priced(cost, "10")).await;
        }

        let removed = ledger.remove(1).await.expect("removed");
        assert_eq!(removed.cost, Some(2.0));

        let costs: Vec<_> = ledger.list().await.iter().map(|e| e.cost).collect();
        assert_eq!(costs, vec![Some(3.0), Some(1.0)]);
        assert!(ledger.remove(5).await.is_none());
        assert_eq!(ledger.list().await.len(), 2);
    });
}

#[test]
fn stale_delete_sees_fresh_list() {
    block_on(async {
        let backend = MemoryBackend::new();
        let store = Rc::new(PersistentStore::new(backend));
        let first = HistoryLedger::new(Rc::clone(&store), &PanelConfig::default());
        let second = HistoryLedger::new(store, &PanelConfig::default());

        for cost in ["1", "2", "3"] {
            first.append(Mode::Margin, &priced(cost, "10")).await;
        }
        assert_eq!(first.list().await.len(), 3);

        second.remove(0).await;
        // row #3 of the old rendering no longer exists
        assert!(first.remove(2).await.is_none());
        assert_eq!(first.list().await.len(), 2);
    });
}

#[test]
fn clear_empties_storage() {
    block_on(async {
        let (ledger, backend) = ledger();
        ledger.append(Mode::Margin, &priced("10", "20")).await;
        ledger.clear().await;

        assert!(ledger.list().await.is_empty());
        assert_eq!(backend.record(StorageKey::History), Some(serde_json::json!([])));
    });
}

#[test]
fn stored_format_uses_short_field_names() {
    block_on(async {
        let (ledger, backend) = ledger();
        ledger
            .append_entry(HistoryEntry {
                timestamp: 1_700_000_000_000,
                mode: Mode::Margin,
                cost: Some(10.0),
                price: Some(20.0),
                margin: Some(50.0),
                markup: Some(100.0),
            })
            .await;

        assert_eq!(
            backend.record(StorageKey::History),
            Some(serde_json::json!([{
                "t": 1_700_000_000_000u64,
                "mode": "kate",
                "cost": 10.0,
                "price": 20.0,
                "kate": 50.0,
                "markup": 100.0
            }]))
        );
    });
}

#[test]
fn oversized_stored_list_is_cut_on_load() {
    let entry = |cost: f64| HistoryEntry {
        timestamp: 0,
        mode: Mode::Margin,
        cost: Some(cost),
        price: Some(cost * 2.0),
        margin: Some(50.0),
        markup: Some(100.0),
    };
    let log = HistoryLog::from_entries((0..30).map(|i| entry(i as f64)).collect(), 20, 0.005);

    assert_eq!(log.len(), 20);
    assert_eq!(log.head().and_then(|e| e.cost), Some(0.0));
    assert_eq!(log.capacity(), 20);
}

#[test]
fn one_bad_stored_entry_does_not_cost_the_rest() {
    block_on(async {
        let backend = MemoryBackend::new();
        backend.insert(
            StorageKey::History,
            serde_json::json!([
                {"t": 1, "mode": "kate", "cost": 1.0, "price": 2.0, "kate": 50.0, "markup": 100.0},
                {"t": 2.5, "mode": "kate", "cost": 5.0, "price": 6.0, "kate": 16.7, "markup": 20.0},
                {"t": 3, "mode": "sideways"}
            ]),
        );
        let store = Rc::new(PersistentStore::new(backend.clone()));
        let ledger = HistoryLedger::new(store, &PanelConfig::default());

        let listed = ledger.list().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].timestamp, 1);

        assert_eq!(ledger.append(Mode::Markup, &priced("3", "4")).await, AppendOutcome::Inserted);

        let stored = backend.record(StorageKey::History).expect("history written");
        let costs: Vec<_> = stored
            .as_array()
            .expect("list")
            .iter()
            .map(|entry| entry["cost"].as_f64())
            .collect();
        assert_eq!(costs, vec![Some(3.0), Some(1.0)]);
    });
}
