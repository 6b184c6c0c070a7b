use std::ops::{Add, Mul, Neg, Sub};

pub mod fields;
pub mod input;
pub mod replicated;
pub mod transport;

use fields::MpcField;

/// Private share of a domain element.
/// Sharing is linear: shares support addition, subtraction and scaling by
/// plaintext domain elements without communication.
pub trait MpcShare:
    Copy
    + Clone
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<Self::Field, Output = Self>
{
    /// Field type of value represented by this share.
    type Field: MpcField;

    /// Sharing of zero.
    fn zero() -> Self;

    /// Sharing of doubled value.
    fn double(&self) -> Self;
}

/// Sharing-based MPC computation context.
pub trait MpcContext {
    /// Field type used by this MPC protocol.
    type Field: MpcField;

    /// Share type used by this MPC protocol.
    type Share: MpcShare<Field = Self::Field>;

    /// Number of parties participating in MPC computation.
    fn num_parties(&self) -> usize;

    /// ID of current party.
    fn party_id(&self) -> usize;
}
