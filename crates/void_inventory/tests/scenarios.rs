//! End-to-end inventory scenarios

use void_inventory::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tank(fuel: f64) -> Item {
    Item::new(ItemPayload::new("tank").with_resource("fuel", fuel, 100.0)).with_figures(1.0, 1.0, 10.0)
}

fn bolt() -> Item {
    Item::new(ItemPayload::new("bolt")).with_figures(0.1, 0.1, 1.0)
}

fn inventory(policy: CompatibilityPolicy, width: usize, height: usize) -> SlottedInventory<MemoryContainer> {
    let container = MemoryContainer::new(9)
        .with_stack_limit("tank", 10)
        .with_stack_limit("bolt", 3);
    let config = InventoryConfig::new(width, height).with_policy(policy);
    SlottedInventory::new(InventoryId(1), container, &config)
}

#[test]
fn tanks_stack_by_fill_bucket() {
    init_logging();
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 3, 1);

    let slots: Vec<_> = [50.0, 52.0, 80.0]
        .into_iter()
        .map(|fuel| {
            let id = inv.attach(tank(fuel), &Placement::anywhere()).unwrap();
            inv.display().slot_of(id).unwrap()
        })
        .collect();

    assert_eq!(slots, vec![0, 0, 1]);
    // Host slots keep exact payloads, so every fill level gets its own
    let container = inv.backing().container();
    assert_eq!(container.stored_slots().len(), 3);
    assert!(container.stored_slots().values().all(|slot| slot.quantity == 1));
}

#[test]
fn mixed_fill_levels_survive_save_and_load() {
    init_logging();
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 3, 1);
    let levels = [50.0, 90.0, 50.0, 90.0];
    let ids: Vec<_> = levels
        .iter()
        .map(|&fuel| inv.attach(tank(fuel), &Placement::anywhere()).unwrap())
        .collect();
    assert_eq!(inv.backing().slot_of(ids[0]), inv.backing().slot_of(ids[2]));
    assert_ne!(inv.backing().slot_of(ids[0]), inv.backing().slot_of(ids[1]));

    let bytes = SaveFormat::Binary.encode(&inv.save_layout()).unwrap();
    let layout = SaveFormat::Binary.decode(&bytes).unwrap();
    let mut container = MemoryContainer::new(9).with_stack_limit("tank", 10);
    for (&index, slot) in inv.backing().container().stored_slots() {
        container.host_store(index, slot.payload.clone(), slot.quantity);
    }
    let mut loaded = SlottedInventory::new(InventoryId(1), container, &InventoryConfig::new(3, 1));
    loaded.restore(&layout, &MetadataTable::new()).unwrap();

    for (&id, &fuel) in ids.iter().zip(&levels) {
        let item = loaded.store().find(id).unwrap();
        assert_eq!(item.payload.resource("fuel").unwrap().amount, fuel);
        assert_eq!(loaded.display().slot_of(id), inv.display().slot_of(id));
    }
}

#[test]
fn full_slot_respected_or_relaxed() {
    init_logging();

    let mut strict = inventory(CompatibilityPolicy::RespectCapacity, 3, 3);
    for _ in 0..3 {
        strict.attach(bolt(), &Placement::backing_slot(2)).unwrap();
    }
    let err = strict.attach(bolt(), &Placement::backing_slot(2)).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Capacity);
    assert_eq!(strict.store().len(), 3);

    let mut custom = inventory(CompatibilityPolicy::Custom, 3, 3);
    for _ in 0..3 {
        custom.attach(bolt(), &Placement::backing_slot(2)).unwrap();
    }
    custom.drain_events();

    let fourth = custom.attach(bolt(), &Placement::backing_slot(2)).unwrap();
    let slot = custom.backing().container().slot(2).unwrap();
    assert_eq!((slot.quantity, slot.stack_ceiling), (4, 4));
    assert!(custom
        .drain_events()
        .contains(&InventoryEvent::LayoutStabilized { slot: 2 }));

    custom.detach(fourth).unwrap();
    let slot = custom.backing().container().slot(2).unwrap();
    assert_eq!((slot.quantity, slot.stack_ceiling), (3, 3));
}

#[test]
fn cancelled_lease_leaves_items_in_place() {
    init_logging();
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 2, 2);
    let ids: Vec<_> = (0..5)
        .map(|_| inv.attach(tank(50.0), &Placement::anywhere()).unwrap())
        .collect();
    let before = inv.save_layout();

    let mut leases = LeaseManager::new();
    let lease = DragLease::new(
        ids.clone(),
        LeasePayload::default(),
        |_: &mut SlottedInventory<MemoryContainer>, _| Ok(()),
        |_, _| {},
    );
    leases.lease(&mut inv, lease).unwrap();
    assert!(ids.iter().all(|&id| inv.is_item_locked(id)));
    assert!(inv.display().slot(0).unwrap().is_locked());
    assert_eq!(inv.display().slot(0).unwrap().reserved_count(), 5);

    assert!(leases.cancel(&mut inv));
    assert!(ids.iter().all(|&id| !inv.is_item_locked(id)));
    assert!(!inv.display().slot(0).unwrap().is_locked());
    assert_eq!(inv.save_layout(), before);
}

#[test]
fn second_lease_is_refused() {
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 2, 2);
    let a = inv.attach(tank(50.0), &Placement::anywhere()).unwrap();
    let b = inv.attach(tank(90.0), &Placement::anywhere()).unwrap();

    let noop = |items: Vec<ItemId>| {
        DragLease::new(
            items,
            LeasePayload::default(),
            |_: &mut SlottedInventory<MemoryContainer>, _| Ok(()),
            |_, _| {},
        )
    };
    let mut leases = LeaseManager::new();
    leases.lease(&mut inv, noop(vec![a])).unwrap();

    let err = leases.lease(&mut inv, noop(vec![b])).unwrap_err();
    assert_eq!(err.class(), ErrorClass::LeaseInProgress);
    assert_eq!(leases.items(), &[a]);
    assert!(!inv.is_item_locked(b));
    assert_eq!(leases.state(), LeaseState::Leased);
}

#[test]
fn host_changes_are_reconciled() {
    init_logging();
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 3, 1);
    let metadata = MetadataTable::new().with_kind("bolt", KindMetadata::new(0.1, 0.1, 1.0));
    let a = inv.attach(bolt(), &Placement::anywhere()).unwrap();
    let b = inv.attach(bolt(), &Placement::anywhere()).unwrap();
    inv.set_item_locked(b, true);

    // The host empties the bolt slot; the leased bolt survives
    inv.container_mut().host_set_quantity(0, 0);
    let report = inv.on_external_change(&metadata);
    assert_eq!(report.destroyed, vec![a]);
    assert_eq!(report.skipped_locked, vec![b]);
    assert!(inv.store().contains(b));
    assert_eq!(inv.display().slot_of(a), None);

    // The host adds two bolts elsewhere
    inv.container_mut().host_store(5, ItemPayload::new("bolt"), 2);
    let report = inv.on_external_change(&metadata);
    assert_eq!(report.created.len(), 2);
    assert_eq!(inv.store().len(), 3);
    for id in &report.created {
        assert_eq!(inv.backing().slot_of(*id), Some(5));
        assert!(inv.display().slot_of(*id).is_some());
    }
}

#[test]
fn layout_survives_save_and_load() {
    init_logging();
    let mut inv = inventory(CompatibilityPolicy::RespectCapacity, 2, 2);
    let full = inv.attach(tank(100.0), &Placement::exactly(3)).unwrap();
    let bolts: Vec<_> = (0..4)
        .map(|_| inv.attach(bolt(), &Placement::near([1])).unwrap())
        .collect();
    let layout = inv.save_layout();

    for format in [SaveFormat::Json, SaveFormat::Binary] {
        let bytes = format.encode(&layout).unwrap();
        let decoded = format.decode(&bytes).unwrap();

        let mut container = MemoryContainer::new(9)
            .with_stack_limit("tank", 10)
            .with_stack_limit("bolt", 3);
        for (&index, slot) in inv.backing().container().stored_slots() {
            container.host_store(index, slot.payload.clone(), slot.quantity);
        }
        let mut loaded = SlottedInventory::new(InventoryId(1), container, &InventoryConfig::new(2, 2));
        loaded.restore(&decoded, &MetadataTable::new()).unwrap();

        assert_eq!(loaded.store().len(), 5);
        assert_eq!(loaded.display().slot_of(full), Some(3));
        for id in &bolts {
            assert_eq!(loaded.display().slot_of(*id), inv.display().slot_of(*id));
            assert_eq!(loaded.backing().slot_of(*id), inv.backing().slot_of(*id));
        }
        assert_eq!(loaded.save_layout(), layout);
    }
}

#[test]
fn drag_between_inventories() {
    init_logging();
    let mut registry = InventoryRegistry::new();
    for id in [1, 2] {
        let container = MemoryContainer::new(4).with_stack_limit("tank", 10);
        registry.register(SlottedInventory::new(InventoryId(id), container, &InventoryConfig::new(2, 1)));
    }
    let moved = registry
        .get_mut(InventoryId(1))
        .unwrap()
        .attach(tank(50.0), &Placement::anywhere())
        .unwrap();

    let mut controller = InventoryController::new(registry);
    controller.handle(InventoryInput::HoverEnter {
        inventory: InventoryId(1),
        slot: 0,
    });
    controller.handle(InventoryInput::Click {
        button: MouseButton::Left,
        modifier: Modifier::None,
    });
    assert_eq!(controller.state(), InteractionState::Dragging);

    controller.handle(InventoryInput::HoverLeave);
    controller.handle(InventoryInput::HoverEnter {
        inventory: InventoryId(2),
        slot: 1,
    });
    controller.handle(InventoryInput::Click {
        button: MouseButton::Left,
        modifier: Modifier::None,
    });

    assert_eq!(controller.state(), InteractionState::Hovering);
    assert_eq!(controller.drain_feedback(), vec![Feedback::Positive]);
    assert_eq!(controller.registry().owner_of(moved), Some(InventoryId(2)));
    let target = controller.registry().get(InventoryId(2)).unwrap();
    assert_eq!(target.display().slot_of(moved), Some(1));
    assert!(!target.store().is_locked(moved));
}
