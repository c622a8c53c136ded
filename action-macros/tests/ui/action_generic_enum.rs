use action_core::ActionKind;
use action_macros::action;

#[action(kind = "load")]
enum Load<T: Clone> {
    One(T),
    Many(Vec<T>),
}

#[action]
struct Wrapper<T>(T);

fn main() {
    assert_eq!(<Load<u8> as ActionKind>::KIND, "load");
    assert_eq!(<Wrapper<String> as ActionKind>::KIND, "Wrapper");

    let _ = [Load::One(1u8), Load::Many(vec![2, 3])];
    let _ = Wrapper(0u8).0;
}
