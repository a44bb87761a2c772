use std::marker::PhantomData;

/// Zero-sized marker that makes its owner `!Send` (and `!Sync`).
#[derive(Default)]
pub(crate) struct PhantomNotSend(PhantomData<*mut ()>);
