//! FormStore port - コメント作成フォーム

/// FormStore はフォームの入力欄へのアクセスを提供
pub trait FormStore: Send + Sync {
    fn author(&self) -> String;

    fn body(&self) -> String;

    /// Blank both fields.
    fn reset_fields(&self);
}
