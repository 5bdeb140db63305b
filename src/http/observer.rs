//! Response observation.
//!
//! Wraps a response body and records the status plus the size of the most
//! recent data frame, without touching headers, status or body bytes.
//!
//! Only the last write is kept, not a running total: a handler streaming
//! `"hello"` then `"ok"` is recorded as 2 bytes.

use axum::http::{Response, StatusCode};
use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// What the observer saw by the time the body finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observed {
    pub status: StatusCode,
    /// Byte length of the last data frame.
    pub response_size: usize,
}

type OnComplete = Box<dyn FnOnce(Observed) + Send>;

pin_project! {
    /// Body decorator that reports an [`Observed`] summary exactly once, when
    /// the body ends or is dropped, whichever comes first.
    pub struct ResponseObserver<B> {
        #[pin]
        inner: B,
        status: StatusCode,
        last_write: usize,
        on_complete: Option<OnComplete>,
    }

    impl<B> PinnedDrop for ResponseObserver<B> {
        fn drop(this: Pin<&mut Self>) {
            let this = this.project();
            if let Some(on_complete) = this.on_complete.take() {
                on_complete(Observed {
                    status: *this.status,
                    response_size: *this.last_write,
                });
            }
        }
    }
}

impl<B> ResponseObserver<B> {
    pub fn new(
        inner: B,
        status: StatusCode,
        on_complete: impl FnOnce(Observed) + Send + 'static,
    ) -> Self {
        Self {
            inner,
            status,
            last_write: 0,
            on_complete: Some(Box::new(on_complete)),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn response_size(&self) -> usize {
        self.last_write
    }
}

/// Wrap the body of `response`, keeping its parts untouched.
pub fn observe<B>(
    response: Response<B>,
    on_complete: impl FnOnce(Observed) + Send + 'static,
) -> Response<ResponseObserver<B>> {
    let status = response.status();
    response.map(|body| ResponseObserver::new(body, status, on_complete))
}

impl<B> Body for ResponseObserver<B>
where
    B: Body,
    B::Data: Buf,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let polled = ready!(this.inner.poll_frame(cx));
        match &polled {
            Some(Ok(frame)) => {
                if let Some(data) = frame.data_ref() {
                    *this.last_write = data.remaining();
                }
            }
            Some(Err(_)) => {}
            None => {
                if let Some(on_complete) = this.on_complete.take() {
                    on_complete(Observed {
                        status: *this.status,
                        response_size: *this.last_write,
                    });
                }
            }
        }
        Poll::Ready(polled)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B> fmt::Debug for ResponseObserver<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseObserver")
            .field("status", &self.status)
            .field("last_write", &self.last_write)
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}
