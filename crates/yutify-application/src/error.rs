// SPDX-License-Identifier: GPL-3.0-or-later
use thiserror::Error;
use yutify_domain::DomainError;

/// Client-input errors raised before any catalog is consulted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("Both an artist and a song are required")]
    EmptyQuery,
}
