// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-load notification capability.

use std::any::Any;

/// Implemented by settings types that need to act once their object graph is
/// fully populated.
///
/// Declaring the implementation is not enough: the type's descriptor must opt
/// in with [`TypeBuilder::load_listener`](crate::domain::TypeBuilder::load_listener)
/// so the loader can find the capability at runtime.
///
/// The `sender` is the [`SettingsLoader`](crate::service::SettingsLoader) when
/// the settings were located through a named section, or whatever the caller
/// passed to [`load_settings`](crate::service::load_settings).
///
/// The loader caches the settings only after this hook returns. Calling
/// [`SettingsLoader::settings`](crate::service::SettingsLoader::settings) on
/// the sender from inside the hook returns a configuration error rather than
/// the object being notified.
///
/// # Examples
///
/// ```
/// use graphcfg::domain::LoadListener;
/// use std::any::Any;
///
/// struct Settings {
///     loaded: bool,
/// }
///
/// impl LoadListener for Settings {
///     fn on_post_load(&mut self, _sender: Option<&dyn Any>) {
///         self.loaded = true;
///     }
/// }
/// ```
pub trait LoadListener {
    /// Called exactly once after deserialization.
    fn on_post_load(&mut self, sender: Option<&dyn Any>);
}
