use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

/// Opaque record ids in the `PREFIX_<unix-millis>_<random>` shape shared by
/// appointments (`APT_`), users (`USR_`) and payment references (`PAY_`).
pub fn generate_id(prefix: &str, random_len: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(random_len)
        .map(char::from)
        .collect();
    format!("{}_{}_{}", prefix, Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn ids_have_the_expected_shape() {
        let id = generate_id("APT", 8);
        assert!(id.starts_with("APT_"));
        assert_eq!(id.split('_').count(), 3);
    }

    #[test]
    fn concurrent_generation_never_collides() {
        let handles: Vec<_> = (0..10)
            .map(|_| {
                thread::spawn(|| -> Vec<String> {
                    (0..1000).map(|_| generate_id("APT", 8)).collect()
                })
            })
            .collect();

        let ids: HashSet<String> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("id generator thread panicked"))
            .collect();
        assert_eq!(ids.len(), 10_000);
    }
}
