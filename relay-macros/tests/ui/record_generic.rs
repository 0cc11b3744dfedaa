use relay_core::{Binding, EventRecord, EventRegistry};

#[derive(EventRecord)]
#[event_record(name = "pickup")]
struct Pickup<T> {
    item: T,
}

fn main() {
    let registry = EventRegistry::new();
    let bus = registry.bus::<Pickup<u8>>();
    let binding = Binding::new(|p: &Pickup<u8>| {
        assert_eq!(p.item, 3);
        Ok(())
    });
    bus.register(&binding);
    bus.raise(&Pickup { item: 3u8 }).unwrap();
    assert_eq!(<Pickup<String> as relay_core::record::EventRecord>::NAME, "pickup");
}
