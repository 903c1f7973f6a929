#[cfg(test)]
#[allow(deprecated)]
mod tests {
    use std::io::{Read, Write};
    use std::sync::Arc;

    use transform_core::{
        codecs::{
            declare_builtin_metadata, register_builtin_factories, Aes256GcmTransform,
            ChaCha20Poly1305Transform, DeflateTransform, Lz4Transform, PassthroughTransform, ZstdTransform,
        },
        constants::transform_ids,
        identity::{IdentityRegistry, MetadataTable},
        manager::{acquire_singleton, FactoryTable, InstanceManager, TransformManager},
        transform::{downcast_ref, StreamTransform, TransformId, TransformOptions, TransformType},
        types::{ConfigurationError, ConstructionError, ProcessingError, TransformError},
    };

    /// Copies input; carries a tag so instances can be told apart.
    #[derive(Debug, Default)]
    struct Tagged(u32);

    impl StreamTransform for Tagged {
        fn forward_process(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            _options: &TransformOptions,
        ) -> Result<u64, ProcessingError> {
            std::io::copy(input, output).map_err(|e| ProcessingError::from_io("tagged", e))
        }

        fn reverse_process(
            &self,
            input: &mut dyn Read,
            output: &mut dyn Write,
            options: &TransformOptions,
        ) -> Result<u64, ProcessingError> {
            self.forward_process(input, output, options)
        }
    }

    #[derive(Debug, Default)]
    struct Unlisted;

    impl StreamTransform for Unlisted {
        fn forward_process(
            &self,
            _input: &mut dyn Read,
            _output: &mut dyn Write,
            _options: &TransformOptions,
        ) -> Result<u64, ProcessingError> {
            Ok(0)
        }

        fn reverse_process(
            &self,
            _input: &mut dyn Read,
            _output: &mut dyn Write,
            _options: &TransformOptions,
        ) -> Result<u64, ProcessingError> {
            Ok(0)
        }
    }

    fn local_manager() -> TransformManager {
        let table = Arc::new(MetadataTable::new());
        declare_builtin_metadata(&table);
        table.declare_identifier::<Tagged>(0x40u8);
        TransformManager::new(Arc::new(IdentityRegistry::new(table)))
    }

    // -------------------------------------------------------------------------
    // Registration and lookup
    // -------------------------------------------------------------------------

    #[test]
    fn instances_are_indexed_by_type_and_identifier() {
        let manager = local_manager();
        assert!(manager.is_empty());

        let registered = manager.register_instance(Arc::new(Tagged(1))).unwrap();
        let by_type = manager.get_instance(&TransformType::of::<Tagged>()).unwrap();
        let by_id = manager.by_identifier(TransformId(0x40)).unwrap();
        assert!(Arc::ptr_eq(&registered, &by_type));
        assert!(Arc::ptr_eq(&registered, &by_id));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn first_registration_wins() {
        let manager = local_manager();
        let first = manager.register_instance(Arc::new(Tagged(1))).unwrap();
        let second = manager.register_instance(Arc::new(Tagged(2))).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(downcast_ref::<Tagged>(second.as_ref()).unwrap().0, 1);
    }

    #[test]
    fn unidentified_types_are_not_registered() {
        let manager = local_manager();
        let err = manager.register_instance(Arc::new(Unlisted)).unwrap_err();
        assert!(matches!(err, ConfigurationError::MissingIdentifier { .. }));
        assert!(manager.get_instance(&TransformType::of::<Unlisted>()).is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn unknown_identifier_is_reported() {
        let manager = local_manager();
        let err = manager.by_identifier(TransformId(0xEE)).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownIdentifier { id: TransformId(0xEE) });
        assert!(err.to_string().contains("0xee"));
    }

    #[test]
    fn downcast_checks_the_concrete_type() {
        let shared: Arc<dyn StreamTransform> = Arc::new(Tagged(7));
        assert_eq!(downcast_ref::<Tagged>(shared.as_ref()).unwrap().0, 7);
        assert!(downcast_ref::<Unlisted>(shared.as_ref()).is_none());
        assert_eq!(shared.transform_type(), TransformType::of::<Tagged>());
    }

    // -------------------------------------------------------------------------
    // Built-ins on the process-wide registry
    // -------------------------------------------------------------------------

    #[test]
    fn builtins_are_reachable_by_wire_identifier() {
        let manager = TransformManager::with_builtins().unwrap();
        let expected: Vec<TransformId> = [
            transform_ids::PASSTHROUGH,
            transform_ids::DEFLATE,
            transform_ids::ZSTD,
            transform_ids::LZ4,
            transform_ids::AES256_GCM,
            transform_ids::CHACHA20_POLY1305,
        ]
        .into_iter()
        .map(TransformId::from)
        .collect();
        assert_eq!(manager.identifiers(), expected);

        for id in expected {
            let t = manager.by_identifier(id).unwrap();
            assert_eq!(t.identifier().unwrap(), id);
        }
    }

    #[test]
    fn builtin_security_flags() {
        let manager = TransformManager::with_builtins().unwrap();
        for (ty, critical) in [
            (TransformType::of::<PassthroughTransform>(), false),
            (TransformType::of::<DeflateTransform>(), false),
            (TransformType::of::<ZstdTransform>(), false),
            (TransformType::of::<Lz4Transform>(), false),
            (TransformType::of::<Aes256GcmTransform>(), true),
            (TransformType::of::<ChaCha20Poly1305Transform>(), true),
        ] {
            let t = manager.get_instance(&ty).unwrap();
            assert_eq!(t.is_security_critical(), critical, "{}", ty);
            assert_eq!(manager.registry().is_security_critical_for(ty), critical);
        }
    }

    #[test]
    fn identifiers_display_builtin_names() {
        assert_eq!(TransformId(transform_ids::ZSTD).to_string(), "Zstd");
        assert_eq!(TransformId(0x7f).to_string(), "0x7f");
    }

    // -------------------------------------------------------------------------
    // Legacy singleton acquisition
    // -------------------------------------------------------------------------

    #[test]
    fn singleton_is_constructed_once_and_registered() {
        let manager = local_manager();
        let factories = FactoryTable::new();
        factories.register::<Tagged>();

        let first = acquire_singleton::<Tagged>(&manager, &factories).unwrap();
        let second = acquire_singleton::<Tagged>(&manager, &factories).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &manager.by_identifier(TransformId(0x40)).unwrap()));
    }

    #[test]
    fn singleton_prefers_an_existing_instance() {
        let manager = local_manager();
        let existing = manager.register_instance(Arc::new(Tagged(9))).unwrap();

        // No factory needed when the manager already holds one.
        let acquired = acquire_singleton::<Tagged>(&manager, &FactoryTable::new()).unwrap();
        assert!(Arc::ptr_eq(&existing, &acquired));
    }

    #[test]
    fn singleton_without_factory_fails() {
        let manager = local_manager();
        let err = acquire_singleton::<Tagged>(&manager, &FactoryTable::new()).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Construction(ConstructionError::NoFactory { .. })
        ));
        assert!(manager.is_empty());
    }

    #[test]
    fn singleton_factory_must_build_the_requested_type() {
        let manager = local_manager();
        let factories = FactoryTable::new();
        factories.register_with(TransformType::of::<Tagged>(), || -> Arc<dyn StreamTransform> {
            Arc::new(PassthroughTransform)
        });

        let err = acquire_singleton::<Tagged>(&manager, &factories).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Construction(ConstructionError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn singleton_of_unidentified_type_is_a_configuration_error() {
        let manager = local_manager();
        let factories = FactoryTable::new();
        factories.register::<Unlisted>();

        let err = acquire_singleton::<Unlisted>(&manager, &factories).unwrap_err();
        assert!(matches!(
            err,
            TransformError::Configuration(ConfigurationError::MissingIdentifier { .. })
        ));
    }

    #[test]
    fn builtin_factories_cover_every_builtin() {
        let manager = local_manager();
        let factories = FactoryTable::new();
        register_builtin_factories(&factories);

        let aes = acquire_singleton::<Aes256GcmTransform>(&manager, &factories).unwrap();
        assert!(downcast_ref::<Aes256GcmTransform>(aes.as_ref()).is_some());
        acquire_singleton::<Lz4Transform>(&manager, &factories).unwrap();
        assert_eq!(
            manager.identifiers(),
            vec![TransformId(transform_ids::LZ4), TransformId(transform_ids::AES256_GCM)]
        );
    }
}
