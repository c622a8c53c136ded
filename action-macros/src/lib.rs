use proc_macro::TokenStream;

mod action;

/// 动作宏
/// - 为目标结构体或枚举实现 `::action_core::ActionKind`；
/// - 类别名默认取类型名，支持参数：`#[action(kind = "...")]` 覆写；
/// - 仅生成 trait 实现，不修改类型定义本身。
#[proc_macro_attribute]
pub fn action(attr: TokenStream, item: TokenStream) -> TokenStream {
    action::expand(attr, item)
}
