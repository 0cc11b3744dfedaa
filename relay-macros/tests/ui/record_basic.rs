use relay_core::EventRecord;

#[derive(Debug, Clone, EventRecord)]
struct CameraShake {
    intensity: f32,
}

#[derive(EventRecord)]
#[event_record(name = "combat.damage")]
enum Damage {
    Melee { amount: u32 },
    Ranged { amount: u32, distance: f32 },
}

fn main() {
    assert_eq!(<CameraShake as relay_core::record::EventRecord>::NAME, "CameraShake");
    assert_eq!(<Damage as relay_core::record::EventRecord>::NAME, "combat.damage");

    let shake = CameraShake { intensity: 0.5 };
    assert!(shake.clone().intensity > 0.0);
    let _ = Damage::Melee { amount: 1 };
    let _ = Damage::Ranged { amount: 1, distance: 2.0 };
}
