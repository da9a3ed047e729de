// Task spawning and blocking helpers shared by the native and wasm builds.
use core::future::Future;

/// Boxed future returned across trait seams. `Send` on native so it can be
/// handed to the runtime, local on wasm where browser futures are `!Send`.
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformFuture<'a, T> = futures::future::BoxFuture<'a, T>;
#[cfg(target_arch = "wasm32")]
pub type PlatformFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;

/// `Send + Sync` where tasks may hop threads, nothing on wasm.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSendSync: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSendSync for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSendSync {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSendSync for T {}

#[cfg(not(target_arch = "wasm32"))]
pub fn boxed<'a, F>(fut: F) -> PlatformFuture<'a, F::Output>
where
    F: Future + Send + 'a,
{
    Box::pin(fut)
}

#[cfg(target_arch = "wasm32")]
pub fn boxed<'a, F>(fut: F) -> PlatformFuture<'a, F::Output>
where
    F: Future + 'a,
{
    Box::pin(fut)
}

#[cfg(target_arch = "wasm32")]
#[inline]
pub fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(fut);
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use futures::future;
    use once_cell::sync::Lazy;
    use tokio::runtime::{Builder, Handle};

    // One parked runtime for the whole process; we only expose a Handle.
    pub static HANDLE: Lazy<Handle> = Lazy::new(|| {
        let rt = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("drivetime-worker")
            .enable_io()
            .enable_time()
            .build()
            .expect("tokio runtime");

        let handle = rt.handle().clone();
        // Park the owning runtime forever so it never drops (no shutdown panic).
        std::thread::spawn(move || rt.block_on(future::pending::<()>()));
        handle
    });

    #[inline]
    pub fn spawn_detached<F>(fut: F)
    where
        F: core::future::Future<Output = ()> + Send + 'static,
    {
        HANDLE.spawn(fut);
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[inline]
pub fn spawn_detached<F>(fut: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    native::spawn_detached(fut);
}

/// Enter the runtime so reqwest can find a reactor when a future is driven
/// outside of it (e.g. by `platform_await`). Hold the guard for the scope.
#[cfg(not(target_arch = "wasm32"))]
pub fn enter_runtime() -> tokio::runtime::EnterGuard<'static> {
    native::HANDLE.enter()
}

#[cfg(target_arch = "wasm32")]
pub fn enter_runtime() {}

/// Drive a future to completion from synchronous code. On wasm there is no
/// blocking, the future is handed back to be awaited by the caller.
#[cfg(not(target_arch = "wasm32"))]
pub trait PlatformAwait {
    type Output;
    fn platform_await(self) -> Self::Output;
}

#[cfg(target_arch = "wasm32")]
pub trait PlatformAwait {
    type Output;
    type Fut: Future<Output = Self::Output>;
    fn platform_await(self) -> Self::Fut;
}

#[cfg(not(target_arch = "wasm32"))]
impl<Fut> PlatformAwait for Fut
where
    Fut: Future,
{
    type Output = Fut::Output;

    fn platform_await(self) -> Self::Output {
        futures::executor::block_on(self)
    }
}

#[cfg(target_arch = "wasm32")]
impl<Fut> PlatformAwait for Fut
where
    Fut: Future,
{
    type Output = Fut::Output;
    type Fut = Fut;

    fn platform_await(self) -> Self::Fut {
        self
    }
}
