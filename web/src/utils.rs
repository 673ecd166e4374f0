use chrono::prelude::*;
use gloo::storage::{LocalStorage, Storage};
use serde::{Serialize, de::DeserializeOwned};

/// Versioned local storage slot for a persisted value.
pub(crate) trait StorageKey {
    const KEY: &'static str;
}

pub(crate) trait LocalOrDefault {
    fn local_or_default() -> Self;
}

impl<T: StorageKey + Default + DeserializeOwned> LocalOrDefault for T {
    fn local_or_default() -> Self {
        LocalStorage::get(T::KEY).unwrap_or_else(|err| {
            log::debug!("no usable {} in local storage: {:?}", T::KEY, err);
            T::default()
        })
    }
}

pub(crate) trait LocalSave {
    fn local_save(&self);
}

impl<T: StorageKey + Serialize> LocalSave for T {
    fn local_save(&self) {
        if let Err(err) = LocalStorage::set(T::KEY, self) {
            log::error!("Could not save {} to local storage: {:?}", T::KEY, err);
        }
    }
}

/// Helper function to use JavaScript's Math.random
pub(crate) fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes(std::array::from_fn(|_| (256. * random()) as u8))
}

pub(crate) fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

pub(crate) fn is_narrow_viewport() -> bool {
    gloo::utils::window()
        .inner_width()
        .ok()
        .and_then(|width| width.as_f64())
        .is_some_and(|width| width < 600.)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use serde::Deserialize;
    use wasm_bindgen_test::*;

    use super::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Probe {
        hits: u32,
    }

    impl StorageKey for Probe {
        const KEY: &'static str = "minigames:test:probe";
    }

    #[wasm_bindgen_test]
    fn saved_values_load_back() {
        LocalStorage::delete(Probe::KEY);
        assert_eq!(Probe::local_or_default(), Probe::default());

        Probe { hits: 3 }.local_save();
        assert_eq!(Probe::local_or_default(), Probe { hits: 3 });
        LocalStorage::delete(Probe::KEY);
    }

    #[wasm_bindgen_test]
    fn garbage_falls_back_to_default() {
        LocalStorage::set(Probe::KEY, "not a probe").unwrap();
        assert_eq!(Probe::local_or_default(), Probe::default());
        LocalStorage::delete(Probe::KEY);
    }

    #[wasm_bindgen_test]
    fn seeds_differ() {
        assert_ne!(js_random_seed(), js_random_seed());
    }
}
