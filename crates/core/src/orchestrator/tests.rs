use std::collections::HashSet;

use serde_json::json;
use sessiondeck_protocol::{PartitionKey, TabId, TabKind};
use tokio::sync::mpsc;

use super::*;
use crate::memory::{JournalEntry, MemoryInjector, MemorySession, MemorySessionFactory};
use crate::popup::Anchor;
use crate::session::{SessionEvent, event_channel};

const HOME: &str = "https://console.example";

struct Harness {
	deck: Orchestrator<MemorySession>,
	factory: MemorySessionFactory,
	events: mpsc::UnboundedReceiver<TabEvent>,
	seen_partitions: HashSet<PartitionKey>,
}

impl Harness {
	fn new() -> Self {
		Self::with_factory(MemorySessionFactory::new())
	}

	fn with_factory(factory: MemorySessionFactory) -> Self {
		let (tx, events) = event_channel();
		let config = DeckConfig {
			home_url: HOME.to_string(),
			search_template: "https://search.example/?q={query}".to_string(),
			..DeckConfig::default()
		};
		let mut deck = Orchestrator::new(&config, tx).unwrap();
		deck.create_pinned(|spec, sink| factory.build(spec, sink)).unwrap();
		let mut harness = Self {
			deck,
			factory,
			events,
			seen_partitions: HashSet::new(),
		};
		harness.seen_partitions.insert(PartitionKey::main());
		harness.pump();
		harness
	}

	fn create(&mut self, url: &str) -> TabId {
		let factory = &self.factory;
		let id = self
			.deck
			.create_tab(url, TabKind::Generic, |spec, sink| factory.build(spec, sink))
			.unwrap();
		let partition = self.deck.registry().get(id).unwrap().partition().clone();
		assert!(self.seen_partitions.insert(partition), "partition reused");
		id
	}

	/// Folds every queued session event, returning pop-out requests.
	fn pump(&mut self) -> Vec<TabRequest> {
		let mut requests = Vec::new();
		while let Ok(event) = self.events.try_recv() {
			requests.extend(self.deck.on_session_event(event));
		}
		requests
	}

	fn assert_invariants(&self) {
		let registry = self.deck.registry();
		let pinned = registry.pinned_id().expect("pinned tab missing");
		assert_eq!(registry.get(pinned).unwrap().partition(), &PartitionKey::main());
		let active = registry.active_id().expect("no active tab");
		assert!(registry.contains(active), "active id {active} does not exist");
		for tab in registry.iter() {
			assert_eq!(tab.partition().is_main(), tab.is_pinned());
			if !tab.is_pinned() {
				assert_eq!(tab.partition(), &PartitionKey::for_tab(tab.id()));
			}
		}
	}

	fn reloads(&self, id: TabId) -> usize {
		self.factory
			.journal()
			.count(|e| matches!(e, JournalEntry::Reload { tab_id } if *tab_id == id))
	}
}

fn inbound_payload(url: &str, label: &str) -> serde_json::Value {
	json!({
		"type": "OPEN_AUTHENTICATED_TAB",
		"url": url,
		"accountLabel": label,
		"cookies": [
			{ "name": "sid", "value": label, "domain": ".creator.example", "path": "/", "secure": true, "httpOnly": true, "sameSite": "lax" },
			{ "name": "pref", "value": "dark", "domain": ".creator.example", "expirationDate": 1900000000.0 }
		]
	})
}

#[test]
fn pinned_only_then_create_and_remove_scenario() {
	let mut h = Harness::new();
	assert_eq!(h.deck.registry().active_id(), Some(TabId::new(1)));
	assert_eq!(h.deck.registry().len(), 1);

	let a = h.create("https://a.example");
	assert_eq!(a, TabId::new(2));
	assert_eq!(h.deck.registry().get(a).unwrap().partition().as_str(), "tab:2");
	assert_eq!(h.deck.registry().active_id(), Some(a));

	let b = h.create("https://b.example");
	assert_eq!(b, TabId::new(3));
	assert_eq!(h.deck.registry().active_id(), Some(b));

	assert!(h.deck.remove_tab(a));
	assert!(!h.deck.registry().contains(a));
	assert_eq!(h.deck.registry().active_id(), Some(b));

	assert!(h.deck.remove_tab(b));
	assert_eq!(h.deck.registry().active_id(), Some(TabId::new(1)));
	assert_eq!(h.deck.address(), HOME);
	h.assert_invariants();
}

#[test]
fn invariants_hold_across_mixed_sequences() {
	let mut h = Harness::new();
	let mut seed: u64 = 0x9e37_79b9_7f4a_7c15;
	let mut next = move || {
		seed ^= seed << 13;
		seed ^= seed >> 7;
		seed ^= seed << 17;
		seed
	};

	for step in 0..300 {
		let ids: Vec<TabId> = h.deck.registry().iter().map(|t| t.id()).collect();
		let pick = ids[(next() as usize) % ids.len()];
		match next() % 4 {
			0 | 1 => {
				h.create(&format!("https://t{step}.example"));
			}
			2 => {
				let was_active = h.deck.registry().active_id() == Some(pick);
				let removed = h.deck.remove_tab(pick);
				if removed && was_active {
					assert_ne!(h.deck.registry().active_id(), Some(pick));
				}
			}
			_ => {
				h.deck.switch_active(pick);
			}
		}
		h.pump();
		h.assert_invariants();
	}
}

#[test]
fn pinned_tab_and_unknown_ids_are_no_ops() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	let before = h.deck.snapshot();

	assert!(!h.deck.remove_tab(TabId::new(1)));
	assert!(!h.deck.remove_tab(TabId::new(42)));
	assert!(!h.deck.switch_active(TabId::new(42)));
	assert!(!h.deck.hover_tab(TabId::new(42), Anchor::default()));
	assert!(h.deck.on_session_event(TabEvent { tab_id: TabId::new(42), event: SessionEvent::LoadFinished }).is_none());

	assert_eq!(h.deck.snapshot(), before);
	assert_eq!(h.deck.registry().active_id(), Some(a));
}

#[test]
fn removed_ids_are_never_reused() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.deck.remove_tab(a);
	let b = h.create("https://b.example");
	assert!(b > a);
	assert_eq!(h.deck.registry().get(b).unwrap().partition(), &PartitionKey::for_tab(b));
}

#[test]
fn removing_a_tab_releases_its_session() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.deck.remove_tab(a);
	assert!(h.factory.journal().entries().contains(&JournalEntry::Released { tab_id: a }));
}

#[test]
fn switch_syncs_address_from_live_url() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.pump();
	h.factory.page(a).unwrap().navigate_in_page("https://a.example/#inbox");

	h.deck.switch_active(TabId::new(1));
	assert_eq!(h.deck.address(), HOME);

	// Not folded yet; the live URL still wins over the cached one.
	h.deck.switch_active(a);
	assert_eq!(h.deck.address(), "https://a.example/#inbox");
	assert_eq!(h.deck.registry().get(a).unwrap().url(), "https://a.example");
}

#[test]
fn switch_falls_back_to_cached_url_before_first_load() {
	let mut h = Harness::with_factory(MemorySessionFactory::new().without_autoload());
	let a = h.create("https://slow.example");
	assert_eq!(h.deck.address(), "https://slow.example");

	h.deck.switch_active(TabId::new(1));
	h.deck.switch_active(a);
	assert_eq!(h.deck.address(), "https://slow.example");

	h.factory.page(a).unwrap().finish_load("https://slow.example/landing");
	h.pump();
	assert_eq!(h.deck.address(), "https://slow.example/landing");
	assert_eq!(h.deck.registry().get(a).unwrap().title(), "slow.example");
}

#[test]
fn navigate_resolves_input_and_updates_address_optimistically() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");

	assert_eq!(h.deck.navigate("example.com").as_deref(), Some("https://example.com"));
	assert_eq!(h.deck.address(), "https://example.com");
	assert_eq!(
		h.deck.navigate("hello world").as_deref(),
		Some("https://search.example/?q=hello%20world")
	);
	assert!(h.deck.navigate("   ").is_none());

	let navigations = h
		.factory
		.journal()
		.count(|e| matches!(e, JournalEntry::Navigate { tab_id, .. } if *tab_id == a));
	assert_eq!(navigations, 2);
}

#[test]
fn history_controls_follow_the_active_session() {
	let mut h = Harness::new();
	h.create("https://a.example");
	assert!(!h.deck.go_back());

	h.deck.navigate("b.example");
	h.pump();
	assert!(h.deck.snapshot().can_go_back);
	assert!(h.deck.go_back());
	h.pump();
	assert_eq!(h.deck.address(), "https://a.example");
	assert!(h.deck.snapshot().can_go_forward);
	assert!(h.deck.go_forward());
	h.pump();
	assert_eq!(h.deck.address(), "https://b.example");
	assert!(h.deck.reload());
	let active = h.deck.registry().active().unwrap();
	assert_eq!(active.session().history(), vec!["https://a.example", "https://b.example"]);
}

#[test]
fn title_update_uses_event_payload() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.pump();

	h.deck.on_session_event(TabEvent {
		tab_id: a,
		event: SessionEvent::TitleUpdated("Creator Studio".into()),
	});
	assert_eq!(h.deck.registry().get(a).unwrap().title(), "Creator Studio");
}

#[test]
fn inactive_tab_events_fold_without_touching_the_address() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.create("https://b.example");
	h.pump();

	h.factory.page(a).unwrap().navigate_in_page("https://a.example/#drafts");
	h.pump();
	assert_eq!(h.deck.registry().get(a).unwrap().url(), "https://a.example/#drafts");
	assert_eq!(h.deck.address(), "https://b.example");
}

#[test]
fn events_from_removed_tabs_are_dropped() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	let page = h.factory.page(a).unwrap();
	h.deck.remove_tab(a);
	h.pump();

	page.set_title("late");
	page.request_new_window("https://popup.example");
	assert!(h.pump().is_empty());
	assert!(!h.deck.registry().contains(a));
}

#[test]
fn new_window_request_becomes_an_isolated_tab() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.pump();

	h.factory.page(a).unwrap().request_new_window("https://popup.example/oauth");
	let requests = h.pump();
	assert_eq!(
		requests,
		vec![TabRequest {
			url: "https://popup.example/oauth".into(),
			kind: TabKind::Generic,
			opener: a,
		}]
	);

	let popup = h.create(&requests[0].url);
	assert_ne!(h.deck.registry().get(popup).unwrap().partition(), h.deck.registry().get(a).unwrap().partition());
	assert_eq!(h.deck.registry().get(a).unwrap().url(), "https://a.example");
}

#[test]
fn failed_creation_leaves_registry_unchanged() {
	let mut h = Harness::new();
	let before = h.deck.snapshot();
	h.factory.fail_next();

	let factory = &h.factory;
	let err = h
		.deck
		.create_tab("https://a.example", TabKind::Generic, |spec, sink| factory.build(spec, sink))
		.unwrap_err();
	assert_eq!(err.partition, PartitionKey::for_tab(TabId::new(2)));
	assert_eq!(h.deck.snapshot(), before);

	// The failed id is burned, not reused.
	assert_eq!(h.create("https://a.example"), TabId::new(3));
}

#[test]
fn pinned_tab_is_claimed_once_and_retried_after_failure() {
	let (tx, _rx) = event_channel();
	let factory = MemorySessionFactory::new();
	let mut deck = Orchestrator::<MemorySession>::new(&DeckConfig::default(), tx).unwrap();

	factory.fail_next();
	assert!(deck.create_pinned(|spec, sink| factory.build(spec, sink)).is_err());
	assert!(deck.registry().is_empty());

	let home = deck.create_pinned(|spec, sink| factory.build(spec, sink)).unwrap();
	assert_eq!(deck.create_pinned(|spec, sink| factory.build(spec, sink)).unwrap(), home);
	assert!(deck.begin_pinned().is_none());
	assert_eq!(deck.registry().len(), 1);
	assert_eq!(deck.registry().get(home).unwrap().kind(), &TabKind::Home);
}

#[test]
fn malformed_inbound_never_mutates_the_registry() {
	let mut h = Harness::new();
	let before = h.deck.snapshot();
	let payloads = [
		json!("hello"),
		json!(r#"{"type": "PING"}"#),
		json!({ "type": "PING" }),
		json!({ "url": "https://a.example" }),
		json!({ "type": "OPEN_AUTHENTICATED_TAB", "url": "https://a.example" }),
		json!({ "type": "OPEN_AUTHENTICATED_TAB", "url": "", "cookies": [], "accountLabel": "x" }),
		json!({ "type": "OPEN_AUTHENTICATED_TAB", "url": 7, "cookies": [], "accountLabel": "x" }),
	];
	for payload in &payloads {
		assert!(h.deck.accept_inbound(payload).is_none(), "accepted {payload}");
	}
	assert_eq!(h.deck.snapshot(), before);
	assert_eq!(h.create("https://a.example"), TabId::new(2));
}

#[test]
fn inbound_opens_one_tab_with_one_injection_and_reloads() {
	let mut h = Harness::new();
	let injector = MemoryInjector::new();
	let factory = h.factory.clone();

	let id = h
		.deck
		.open_inbound(
			&inbound_payload("https://creator.example/home", "studio-a"),
			|spec, sink| factory.build(spec, sink),
			|partition, cookies| injector.inject_now(partition, cookies),
		)
		.unwrap();

	assert_eq!(h.deck.registry().len(), 2);
	assert_eq!(h.deck.registry().active_id(), Some(id));
	let tab = h.deck.registry().get(id).unwrap();
	assert_eq!(tab.kind(), &TabKind::account("studio-a"));
	assert_eq!(injector.attempts(), vec![PartitionKey::for_tab(id)]);
	assert_eq!(injector.cookies(&PartitionKey::for_tab(id)).len(), 2);
	assert!(injector.cookies(&PartitionKey::main()).is_empty());
	assert_eq!(h.reloads(id), 1);
}

#[test]
fn inbound_posted_as_json_text_is_accepted() {
	let mut h = Harness::new();
	let text = inbound_payload("https://creator.example", "studio-a").to_string();

	let request = h.deck.accept_inbound(&serde_json::Value::String(text)).unwrap();
	assert_eq!(request.pending.kind(), &TabKind::account("studio-a"));
	assert_eq!(request.cookies.len(), 2);
	assert_eq!(request.partition(), &PartitionKey::for_tab(request.pending.id()));
}

#[test]
fn accounts_land_in_separate_partitions() {
	let mut h = Harness::new();
	let injector = MemoryInjector::new();
	let factory = h.factory.clone();
	let mut open = |label: &str| {
		h.deck
			.open_inbound(
				&inbound_payload("https://creator.example", label),
				|spec, sink| factory.build(spec, sink),
				|partition, cookies| injector.inject_now(partition, cookies),
			)
			.unwrap()
	};
	let alice = open("alice");
	let bob = open("bob");

	let alice_jar = injector.cookies(&PartitionKey::for_tab(alice));
	let bob_jar = injector.cookies(&PartitionKey::for_tab(bob));
	assert!(alice_jar.iter().any(|c| c.value == "alice"));
	assert!(!alice_jar.iter().any(|c| c.value == "bob"));
	assert!(bob_jar.iter().any(|c| c.value == "bob"));
}

#[test]
fn failed_injection_keeps_the_tab_unauthenticated() {
	let mut h = Harness::new();
	let injector = MemoryInjector::new();
	injector.set_failing(true);
	let factory = h.factory.clone();

	let id = h
		.deck
		.open_inbound(
			&inbound_payload("https://creator.example", "studio-a"),
			|spec, sink| factory.build(spec, sink),
			|partition, cookies| injector.inject_now(partition, cookies),
		)
		.unwrap();

	assert!(h.deck.registry().contains(id));
	assert_eq!(injector.attempts().len(), 1);
	assert_eq!(h.reloads(id), 0);
}

#[test]
fn injection_completing_after_removal_does_not_reload() {
	let mut h = Harness::new();
	let request = h.deck.accept_inbound(&inbound_payload("https://creator.example", "studio-a")).unwrap();
	assert_eq!(request.cookies.len(), 2);
	let InboundRequest { pending, .. } = request;
	let session = h.factory.build(pending.spec(), pending.sink()).unwrap();
	let id = h.deck.finish_create(pending, session);

	h.deck.remove_tab(id);
	assert!(!h.deck.injection_finished(id, Ok(())));
	assert_eq!(h.reloads(id), 0);
}

#[test]
fn hovered_tab_removal_forces_popup_hidden() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.pump();

	assert!(h.deck.hover_tab(a, Anchor { x: 10.0, y: 0.0, width: 120.0, height: 32.0 }));
	let state = h.deck.snapshot().popup;
	assert!(state.visible);
	assert_eq!(state.title, "a.example");
	assert_eq!(state.url, "https://a.example");

	let timer = h.deck.unhover_tab(a).unwrap();
	h.deck.remove_tab(a);
	assert!(!h.deck.snapshot().popup.visible);
	assert!(!h.deck.hide_timer_elapsed(timer.token));
}

#[test]
fn popup_follows_active_tab_events_unless_editing() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());

	h.factory.page(a).unwrap().navigate_in_page("https://a.example/#one");
	h.pump();
	assert_eq!(h.deck.popup().state().url, "https://a.example/#one");

	h.deck.popup_edit_started();
	h.factory.page(a).unwrap().navigate_in_page("https://a.example/#two");
	h.pump();
	assert_eq!(h.deck.popup().state().url, "https://a.example/#one");
	assert_eq!(h.deck.address(), "https://a.example/#two");

	h.deck.popup_edit_finished();
	assert_eq!(h.deck.popup().state().url, "https://a.example/#two");
}

#[test]
fn popup_ignores_events_of_inactive_tabs() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.create("https://b.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());

	h.factory.page(a).unwrap().set_title("Renamed");
	h.pump();
	assert_eq!(h.deck.popup().state().title, "a.example");
	assert_eq!(h.deck.registry().get(a).unwrap().title(), "Renamed");
}

#[test]
fn switching_to_the_hovered_tab_refreshes_the_popup() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.create("https://b.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());

	let page = h.factory.page(a).unwrap();
	page.navigate_in_page("https://a.example/#drafts");
	page.set_title("Renamed");
	h.pump();
	assert_eq!(h.deck.popup().state().url, "https://a.example");

	assert!(h.deck.switch_active(a));
	let state = h.deck.popup().state();
	assert_eq!(state.url, h.deck.address());
	assert_eq!(state.url, "https://a.example/#drafts");
	assert_eq!(state.title, "Renamed");
}

#[test]
fn promotion_after_removal_refreshes_the_popup() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	let b = h.create("https://b.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());
	h.factory.page(a).unwrap().set_title("Inbox (3)");
	h.pump();

	assert!(h.deck.remove_tab(b));
	assert_eq!(h.deck.registry().active_id(), Some(a));
	assert_eq!(h.deck.popup().state().title, "Inbox (3)");
}

#[test]
fn switching_while_editing_keeps_the_typed_popup_fields() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	h.create("https://b.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());
	h.deck.popup_edit_started();
	h.factory.page(a).unwrap().navigate_in_page("https://a.example/#later");
	h.pump();

	h.deck.switch_active(a);
	assert_eq!(h.deck.popup().state().url, "https://a.example");
	assert_eq!(h.deck.address(), "https://a.example/#later");
}

#[test]
fn invalid_config_is_rejected_up_front() {
	let (tx, _events) = event_channel();
	let config = DeckConfig {
		search_template: "https://search.example/".to_string(),
		..DeckConfig::default()
	};
	let result = Orchestrator::<MemorySession>::new(&config, tx);
	assert!(matches!(result, Err(crate::Error::Config(_))));
}

#[test]
fn sessions_are_created_with_the_configured_user_agent() {
	let (tx, _events) = event_channel();
	let factory = MemorySessionFactory::new();
	let config = DeckConfig {
		user_agent: "DeckTest/1.0".to_string(),
		..DeckConfig::default()
	};
	let mut deck = Orchestrator::new(&config, tx).unwrap();
	deck.create_pinned(|spec, sink| factory.build(spec, sink)).unwrap();
	deck.create_tab("https://a.example", TabKind::Generic, |spec, sink| factory.build(spec, sink))
		.unwrap();

	let specs = factory.specs();
	assert_eq!(specs.len(), 2);
	assert!(specs.iter().all(|spec| spec.user_agent == "DeckTest/1.0"));
	let tab = deck.registry().get(TabId::new(2)).unwrap();
	assert_eq!(tab.session().user_agent(), "DeckTest/1.0");
}

#[test]
fn popup_navigate_targets_the_hovered_tab() {
	let mut h = Harness::new();
	let a = h.create("https://a.example");
	let b = h.create("https://b.example");
	h.pump();
	h.deck.hover_tab(a, Anchor::default());
	h.deck.popup_edit_started();

	assert_eq!(h.deck.popup_navigate("localhost:3000").as_deref(), Some("http://localhost:3000"));
	assert!(!h.deck.popup().is_editing());
	assert_eq!(h.deck.popup().state().url, "http://localhost:3000");
	assert_eq!(h.deck.registry().active_id(), Some(b));
	assert_eq!(h.deck.address(), "https://b.example");
	assert!(
		h.factory
			.journal()
			.entries()
			.contains(&JournalEntry::Navigate { tab_id: a, url: "http://localhost:3000".into() })
	);
}

#[test]
fn snapshot_serializes_for_the_presentation_layer() {
	let mut h = Harness::new();
	h.create("https://a.example");
	h.pump();

	let value = serde_json::to_value(h.deck.snapshot()).unwrap();
	assert_eq!(value["activeId"], 2);
	assert_eq!(value["tabs"][0]["pinned"], true);
	assert_eq!(value["tabs"][0]["partition"], "main");
	assert_eq!(value["tabs"][1]["partition"], "tab:2");
	assert_eq!(value["tabs"][1]["title"], "a.example");
	assert_eq!(value["popup"]["visible"], false);
}
