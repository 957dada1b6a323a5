// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`simple_display!`]: `Display` impl mapping enum variants to string literals
//! - [`builder!`]: test builder struct with Default, setters, and `build()`
//! - [`setters!`]: chained setters for production config structs

/// Generate a `Display` impl that maps enum variants to string literals.
///
/// Tuple variants use `(..)` to ignore their fields.
///
/// ```ignore
/// crate::simple_display! {
///     NotificationKind {
///         Started => "started",
///         Restarted(..) => "restarted",
///     }
/// }
/// ```
#[macro_export]
macro_rules! simple_display {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let label = match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                };
                f.write_str(label)
            }
        }
    };
}

/// Generate a test builder for a plain struct.
///
/// Only compiled for tests and the `test-support` feature.
///
/// - `into { field: Type = default }`: setter takes `impl Into<Type>`
/// - `set { field: Type = default }`: setter takes `Type`
/// - `computed { field: Type = expr }`: filled in by `build()`, no setter
///
/// ```ignore
/// crate::builder! {
///     pub struct ProcessRecordBuilder => ProcessRecord {
///         into { script_name: String = "job.py" }
///         set { restart_count: u32 = 0 }
///         computed { deployment: DeploymentId = DeploymentId::new() }
///     }
/// }
/// ```
#[macro_export]
macro_rules! builder {
    (
        pub struct $builder:ident => $target:ident {
            $(into { $( $into_field:ident : $into_ty:ty = $into_default:expr ),* $(,)? })?
            $(set { $( $set_field:ident : $set_ty:ty = $set_default:expr ),* $(,)? })?
            $(computed { $( $comp_field:ident : $comp_ty:ty = $comp_expr:expr ),* $(,)? })?
        }
    ) => {
        #[cfg(any(test, feature = "test-support"))]
        pub struct $builder {
            $($( $into_field: $into_ty, )*)?
            $($( $set_field: $set_ty, )*)?
        }

        #[cfg(any(test, feature = "test-support"))]
        impl Default for $builder {
            fn default() -> Self {
                Self {
                    $($( $into_field: $into_default.into(), )*)?
                    $($( $set_field: $set_default, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $builder {
            $crate::setters! {
                $(into { $( $into_field: $into_ty ),* })?
                $(set { $( $set_field: $set_ty ),* })?
            }

            pub fn build(self) -> $target {
                $target {
                    $($( $into_field: self.$into_field, )*)?
                    $($( $set_field: self.$set_field, )*)?
                    $($( $comp_field: $comp_expr, )*)?
                }
            }
        }

        #[cfg(any(test, feature = "test-support"))]
        impl $target {
            /// Builder pre-filled with test defaults.
            pub fn builder() -> $builder {
                $builder::default()
            }
        }
    };
}

/// Generate chained setter methods inside an existing `impl` block.
///
/// ```ignore
/// impl SupervisorConfig {
///     dw_core::setters! {
///         set { max_processes: usize, max_restarts: u32 }
///         option { process_timeout: Duration }
///     }
/// }
/// ```
#[macro_export]
macro_rules! setters {
    (
        $(into { $( $into_field:ident : $into_ty:ty ),* $(,)? })?
        $(set { $( $set_field:ident : $set_ty:ty ),* $(,)? })?
        $(option { $( $opt_field:ident : $opt_ty:ty ),* $(,)? })?
    ) => {
        $($(
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?
        $($(
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?
        $($(
            pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(v.into());
                self
            }
        )*)?
    };
}
