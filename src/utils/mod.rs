/// Runs a side effect on a value and hands the value back.
pub trait Also: Sized {
    fn also<F: FnOnce(&Self)>(self, f: F) -> Self {
        f(&self);
        self
    }
}

impl<T> Also for T {}
