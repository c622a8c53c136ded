use action_core::ActionKind;
use action_macros::action;

#[action(kind = "counter.increment")]
struct Increment {
    by: i64,
}

fn main() {
    assert_eq!(Increment::KIND, "counter.increment");
    let _ = Increment { by: 1 }.by;
}
