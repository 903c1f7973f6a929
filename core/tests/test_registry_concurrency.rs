// Racing first access: every thread observes one outcome, metadata is
// queried once on success.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;
    use std::time::Duration;

    use transform_core::{
        identity::{IdentityRegistry, MetadataSource, MetadataTable},
        transform::{TransformId, TransformType},
        types::ConfigurationError,
    };

    const THREADS: usize = 16;

    struct Contended;
    struct Orphan;

    /// Sleeps inside every lookup to widen the race window.
    #[derive(Default)]
    struct SlowSource {
        table: MetadataTable,
        lookups: AtomicUsize,
    }

    impl MetadataSource for SlowSource {
        fn identifier_bindings(&self, ty: &TransformType) -> Vec<TransformId> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.table.identifier_bindings(ty)
        }

        fn security_bindings(&self, ty: &TransformType) -> Vec<bool> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(5));
            self.table.security_bindings(ty)
        }
    }

    fn race<T, F>(registry: &IdentityRegistry, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(&IdentityRegistry) -> T + Sync,
    {
        let barrier = Barrier::new(THREADS);
        thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        f(registry)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
    }

    #[test]
    fn concurrent_first_access_resolves_once() {
        let source = Arc::new(SlowSource::default());
        source.table.declare::<Contended>(42u8, true);
        let registry = IdentityRegistry::new(source.clone());

        let ids = race(&registry, |r| r.identifier_of::<Contended>());
        assert!(ids.iter().all(|id| *id == Ok(TransformId(42))));
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);

        let flags = race(&registry, |r| r.is_security_critical_of::<Contended>());
        assert!(flags.iter().all(|&f| f));
        assert_eq!(source.lookups.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_failures_are_uniform() {
        let source = Arc::new(SlowSource::default());
        let registry = IdentityRegistry::new(source.clone());

        let results = race(&registry, |r| r.identifier_of::<Orphan>());
        let expected = ConfigurationError::MissingIdentifier {
            type_name: TransformType::of::<Orphan>().name(),
        };
        assert!(results.iter().all(|r| *r == Err(expected.clone())));
        // Failures are not cached, so each caller queried once, serialized.
        assert_eq!(source.lookups.load(Ordering::SeqCst), THREADS);
        assert_eq!(registry.cached_len(), (0, 0));
    }
}
