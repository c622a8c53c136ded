use action_core::ActionKind;
use action_macros::action;

#[action]
struct Increment;

#[action]
#[derive(Debug, Clone)]
struct AddTodo {
    title: String,
}

fn main() {
    assert_eq!(Increment::KIND, "Increment");
    assert_eq!(AddTodo::KIND, "AddTodo");

    let todo = AddTodo { title: "milk".into() };
    let _ = format!("{:?}", todo.clone()); // 原有 derive 保持可用
    let _ = todo.title;
}
