/*
 * Copyright (c) Microsoft Corporation.
 * Licensed under the MIT license.
 */

use std::fmt::{Debug, Display};

/// Convenience alias for a `Result<T, AvsError>`.
pub type AvsResult<T> = Result<T, AvsError>;

/// Common error type shared by the search engines.
///
/// The `kind()` tag says which class of failure occurred. The concrete payload (for example
/// [`crate::error::DimensionMismatch`]) can be recovered with the downcasting API.
/// ```rust
/// use avs::{AvsError, AvsErrorKind, error::{DimensionMismatch, ErrorContext}};
///
/// fn push() -> Result<(), AvsError> {
///     Err(DimensionMismatch { expected: 4, got: 3 }.into())
/// }
///
/// let err = push().context("while loading").unwrap_err();
/// assert_eq!(err.kind(), AvsErrorKind::DimensionMismatch);
///
/// let message = err.to_string();
/// assert!(message.contains("while loading"));
///
/// let payload = err.downcast_ref::<DimensionMismatch>().unwrap();
/// assert_eq!(payload.got, 3);
/// ```
///
/// # Backtraces
///
/// Backtraces will be obtained upon the first construction of an `AvsError` if the
/// environment variable `RUST_BACKTRACE=1` is set.
#[derive(Debug)]
pub struct AvsError {
    kind: AvsErrorKind,
    error: anyhow::Error,
}

impl AvsError {
    /// Construct a new `AvsError` encapsulating `err`.
    ///
    /// The caller's file and line are recorded alongside `err`.
    #[track_caller]
    #[inline(never)]
    pub fn new<E>(kind: AvsErrorKind, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind,
            error: anyhow::Error::new(Located::new(err)),
        }
    }

    /// Construct a new `AvsError` encapsulating `err` tagged with `AvsErrorKind::Opaque`.
    #[track_caller]
    #[inline(never)]
    pub fn opaque<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::new(AvsErrorKind::Opaque, err)
    }

    /// Construct a new `AvsError` with the provided error message.
    ///
    /// Errors constructed this way cannot be recovered through downcasting.
    #[track_caller]
    #[inline(never)]
    pub fn message<D>(kind: AvsErrorKind, display: D) -> Self
    where
        D: Display + Debug + Send + Sync + 'static,
    {
        Self {
            kind,
            error: anyhow::Error::msg(Located::new(display)),
        }
    }

    /// Attempt to downcast the error object to a concrete type.
    pub fn downcast<E>(self) -> Result<E, Self>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        match self.error.downcast::<E>() {
            Ok(value) => Ok(value),
            Err(error) => match error.downcast::<Located<E>>() {
                Ok(value) => Ok(value.err),
                Err(error) => Err(Self {
                    kind: self.kind,
                    error,
                }),
            },
        }
    }

    /// Attempt to downcast the error object by reference.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: Display + Debug + Send + Sync + 'static,
    {
        match self.error.downcast_ref::<E>() {
            Some(err) => Some(err),
            None => self.error.downcast_ref::<Located<E>>().map(|e| &e.err),
        }
    }

    /// Attach the context to `Self` and return a new error.
    #[track_caller]
    #[inline(never)]
    pub fn context<C>(self, context: C) -> Self
    where
        C: Display + Debug + Send + Sync + 'static,
    {
        Self {
            kind: self.kind,
            error: self.error.context(Located::new(context)),
        }
    }

    /// Return the kind of the originally constructed error.
    pub fn kind(&self) -> AvsErrorKind {
        self.kind
    }
}

impl Display for AvsError {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        // `{:?}` on `anyhow::Error` prints the whole source chain.
        write!(formatter, "AvsError: {:?}\n\n{:?}", self.kind, self.error)
    }
}

impl std::error::Error for AvsError {
    // The source chain is already part of `Display`.
}

/// Wraps an error with the file and line where it was created or where context was added.
#[derive(Debug)]
struct Located<T>
where
    T: Debug,
{
    err: T,
    location: &'static std::panic::Location<'static>,
}

impl<T> Located<T>
where
    T: Debug,
{
    #[track_caller]
    fn new(err: T) -> Self {
        Self {
            err,
            location: std::panic::Location::caller(),
        }
    }
}

impl<T> Display for Located<T>
where
    T: Display + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "{} -- ({}:{})",
            self.err,
            self.location.file(),
            self.location.line()
        )
    }
}

impl<T> std::error::Error for Located<T>
where
    T: std::error::Error + Debug,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.err.source()
    }
}

//////////////////
// ErrorContext //
//////////////////

/// Add context to a returned error that will be included in the source chain.
pub trait ErrorContext<T> {
    /// Attach the provided context to the error part of the result.
    fn context<C>(self, context: C) -> Result<T, AvsError>
    where
        C: Display + Debug + Send + Sync + 'static;

    /// Attach the provided context to the error part of the result.
    ///
    /// The function `f` will only be evaluated if `self` is an `Err`.
    fn with_context<F, C>(self, f: F) -> Result<T, AvsError>
    where
        C: Display + Debug + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    AvsError: From<E>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T, AvsError>
    where
        C: Display + Debug + Send + Sync + 'static,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(AvsError::from(error).context(context)),
        }
    }

    #[track_caller]
    fn with_context<F, C>(self, f: F) -> Result<T, AvsError>
    where
        C: Display + Debug + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(AvsError::from(error).context(f())),
        }
    }
}

//////////////////
// AvsErrorKind //
//////////////////

/// Tags the class of failure carried by an [`AvsError`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AvsErrorKind {
    /// A vector's length differs from the configured dimension.
    DimensionMismatch,
    /// A kernel received batches whose inner dimensions disagree.
    ShapeMismatch,
    /// An execution path was requested that the machine cannot run.
    UnsupportedHardware,
    /// The index must be trained first.
    NotTrained,
    /// The index was already trained.
    AlreadyTrained,
    /// Invalid index configuration.
    IndexConfigError,
    /// The clustering collaborator failed.
    ClusteringError,
    /// An untagged error.
    Opaque,
}

///////////
// Tests //
///////////
