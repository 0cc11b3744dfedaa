use relay_core::{EventRegistry, TypeCatalog, event_module};

#[event_module]
mod events {
    use relay_core::EventRecord;

    #[derive(EventRecord)]
    pub struct Jump;

    #[derive(Debug, relay_core::EventRecord)]
    #[event_record(name = "audio.play")]
    pub enum PlaySound {
        Click,
    }

    // 泛型载荷不参与自动发现
    #[derive(EventRecord)]
    pub struct Wrapped<T>(pub T);

    // 未派生 EventRecord 的类型会被忽略
    pub struct NotAnEvent;

    #[relay_core::event_module]
    pub mod combat {
        use relay_core::EventRecord;

        #[derive(EventRecord)]
        pub struct Hit;
    }
}

fn main() {
    let mut names: Vec<&str> = events::descriptors().iter().map(|d| d.name()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Hit", "Jump", "audio.play"]);
    assert_eq!(events::combat::descriptors().len(), 1);

    let registry = EventRegistry::new();
    let catalog = TypeCatalog::discover(&registry, events::descriptors());
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.sweep().cleared, 3);

    let _ = events::NotAnEvent;
    let _ = events::Wrapped(1u8);
    let _ = events::PlaySound::Click;
}
