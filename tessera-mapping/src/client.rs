//! Mapping client.

use crate::builder::TypeMappingBuilder;
use crate::config::ClientSettings;
use crate::descriptor::{Mappable, TypeDescriptor};
use crate::error::{MappingError, Result};
use crate::fluent::{RootMappingDescriptor, Untyped};
use crate::node::RootMapping;
use crate::resolve::{DefaultPathResolver, NameResolver, PathResolver, SettingsNameResolver};
use crate::submit::{MappingResponse, MappingSubmitter};
use crate::transport::{OpenSearchTransport, Transport};
use std::sync::Arc;
use tessera_log::{debug, info};

/// Client for the mapping API.
///
/// Every call infers or takes a mapping, resolves index and type names,
/// and submits the document with a single PUT. Nothing is cached between
/// calls, so one client can serve any number of threads.
pub struct MappingClient<X = OpenSearchTransport> {
    transport: Arc<X>,
    settings: Arc<ClientSettings>,
    paths: Arc<dyn PathResolver>,
    names: Arc<dyn NameResolver>,
}

impl<X> Clone for MappingClient<X> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            settings: Arc::clone(&self.settings),
            paths: Arc::clone(&self.paths),
            names: Arc::clone(&self.names),
        }
    }
}

impl MappingClient<OpenSearchTransport> {
    /// Create a client talking to the first node in `settings`.
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let transport = OpenSearchTransport::new(&settings)?;
        Ok(Self::with_transport(transport, settings))
    }

    /// Create a client from `TESSERA_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientSettings::from_env()?)
    }
}

impl<X: Transport> MappingClient<X> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: X, settings: ClientSettings) -> Self {
        Self {
            transport: Arc::new(transport),
            names: Arc::new(SettingsNameResolver::new(settings.clone())),
            paths: Arc::new(DefaultPathResolver),
            settings: Arc::new(settings),
        }
    }

    /// Replace the path convention.
    pub fn with_path_resolver(mut self, paths: impl PathResolver + 'static) -> Self {
        self.paths = Arc::new(paths);
        self
    }

    /// Replace index and type name resolution.
    pub fn with_name_resolver(mut self, names: impl NameResolver + 'static) -> Self {
        self.names = Arc::new(names);
        self
    }

    /// Client settings.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Underlying transport.
    pub fn transport(&self) -> &X {
        &self.transport
    }

    fn submitter(&self) -> MappingSubmitter<'_> {
        MappingSubmitter::new(self.transport.as_ref(), self.paths.as_ref())
    }

    // ========================================================================
    // Inference
    // ========================================================================

    /// Infer and submit `T`'s mapping under its type name and default index.
    pub fn map_from_attributes<T: Mappable>(&self, max_recursion: usize) -> Result<MappingResponse> {
        self.map_descriptor(&T::descriptor(), max_recursion)
    }

    /// Infer and submit `T`'s mapping under its type name in `index`.
    pub fn map_from_attributes_in<T: Mappable>(
        &self,
        index: &str,
        max_recursion: usize,
    ) -> Result<MappingResponse> {
        self.map_descriptor_in(&T::descriptor(), index, max_recursion)
    }

    /// Infer and submit `T`'s mapping as `type_name` in `index`.
    pub fn map_from_attributes_with<T: Mappable>(
        &self,
        index: &str,
        type_name: &str,
        max_recursion: usize,
    ) -> Result<MappingResponse> {
        self.map_descriptor_with(&T::descriptor(), index, type_name, max_recursion)
    }

    /// Infer and submit the mapping of a runtime descriptor under its type
    /// name and default index.
    pub fn map_descriptor(
        &self,
        descriptor: &TypeDescriptor,
        max_recursion: usize,
    ) -> Result<MappingResponse> {
        let index = self.names.index_for(descriptor)?;
        self.map_descriptor_in(descriptor, &index, max_recursion)
    }

    /// Infer and submit the mapping of a runtime descriptor in `index`.
    pub fn map_descriptor_in(
        &self,
        descriptor: &TypeDescriptor,
        index: &str,
        max_recursion: usize,
    ) -> Result<MappingResponse> {
        let type_name = self.names.type_name_for(descriptor);
        self.map_descriptor_with(descriptor, index, &type_name, max_recursion)
    }

    /// Infer and submit the mapping of a runtime descriptor as `type_name`
    /// in `index`.
    pub fn map_descriptor_with(
        &self,
        descriptor: &TypeDescriptor,
        index: &str,
        type_name: &str,
        max_recursion: usize,
    ) -> Result<MappingResponse> {
        info!("Mapping {} as '{}' in '{}'", descriptor.name(), type_name, index);

        let mapping = TypeMappingBuilder::new(max_recursion).build(descriptor, type_name);
        self.submitter().submit(&mapping, index, None, false)
    }

    // ========================================================================
    // Fluent
    // ========================================================================

    /// Submit a fluent declaration for `T`.
    ///
    /// Index and type name default to the ones resolved for `T`.
    pub fn map_fluent<T, F>(&self, declare: F) -> Result<MappingResponse>
    where
        T: Mappable,
        F: FnOnce(RootMappingDescriptor<T>) -> RootMappingDescriptor<T>,
    {
        let declaration = declare(RootMappingDescriptor::new()).into_declaration();
        let descriptor = T::descriptor();

        let index = match declaration.index_name {
            Some(index) => index,
            None => self.names.index_for(&descriptor)?,
        };
        let type_name = declaration
            .type_name
            .unwrap_or_else(|| self.names.type_name_for(&descriptor));

        debug!("Fluent mapping for {} as '{}'", descriptor.name(), type_name);

        let mut mapping = declaration.mapping;
        mapping.name.clone_from(&type_name);
        self.submitter()
            .submit(&mapping, &index, Some(&type_name), declaration.ignore_conflicts)
    }

    /// Submit a fluent declaration not tied to a Rust type.
    ///
    /// The declaration must name its type. The settings' default index is
    /// used when it names no index.
    pub fn map_fluent_untyped<F>(&self, declare: F) -> Result<MappingResponse>
    where
        F: FnOnce(RootMappingDescriptor<Untyped>) -> RootMappingDescriptor<Untyped>,
    {
        let declaration = declare(RootMappingDescriptor::new()).into_declaration();

        let type_name = declaration.type_name.ok_or_else(|| {
            MappingError::InvalidArgument("untyped mapping declares no type name".to_string())
        })?;
        let index = match declaration.index_name {
            Some(index) => index,
            None => self.names.default_index()?,
        };

        self.submitter().submit(
            &declaration.mapping,
            &index,
            Some(&type_name),
            declaration.ignore_conflicts,
        )
    }

    // ========================================================================
    // Pre-built and raw
    // ========================================================================

    /// Submit a pre-built mapping using its own submission options. The
    /// settings' default index is used when the mapping names none.
    pub fn map(&self, mapping: &RootMapping) -> Result<MappingResponse> {
        let index = match mapping.index.as_deref().filter(|index| !index.is_empty()) {
            Some(index) => index.to_string(),
            None => self.names.default_index()?,
        };
        self.map_to(
            mapping,
            &index,
            mapping.type_name.as_deref(),
            mapping.ignore_conflicts,
        )
    }

    /// Submit a pre-built mapping to `index`, optionally under another type
    /// name.
    pub fn map_to(
        &self,
        mapping: &RootMapping,
        index: &str,
        type_name: Option<&str>,
        ignore_conflicts: bool,
    ) -> Result<MappingResponse> {
        self.submitter()
            .submit(mapping, index, type_name, ignore_conflicts)
    }

    /// Submit raw JSON of the form `{"<type>": {...}}` unchanged.
    pub fn map_raw(
        &self,
        type_name: &str,
        mapping: &str,
        index: &str,
        ignore_conflicts: bool,
    ) -> Result<MappingResponse> {
        self.submitter()
            .submit_raw(type_name, mapping, index, ignore_conflicts)
    }
}

impl<X> std::fmt::Debug for MappingClient<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MappingClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{TypeAttributes, TypeShape};
    use crate::node::{DynamicMapping, MappingNode};
    use crate::testing::RecordingTransport;
    use serde_json::json;

    struct Employee;

    impl Mappable for Employee {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Employee>("Employee")
                .member("name", TypeShape::Text)
                .member("manager", TypeShape::Object(Employee::descriptor))
        }
    }

    struct Invoice;

    impl Mappable for Invoice {
        fn descriptor() -> TypeDescriptor {
            TypeDescriptor::of::<Invoice>("Invoice")
                .member("total", TypeShape::Floating)
                .with_attributes(TypeAttributes {
                    type_name: Some("bill".to_string()),
                    index: Some("finance".to_string()),
                    ..Default::default()
                })
        }
    }

    fn client() -> (MappingClient<RecordingTransport>, RecordingTransport) {
        let transport = RecordingTransport::new();
        let settings = ClientSettings::default().with_default_index("main");
        (MappingClient::with_transport(transport.clone(), settings), transport)
    }

    #[test]
    fn test_map_from_attributes_uses_resolved_names() {
        let (client, transport) = client();

        let response = client.map_from_attributes::<Employee>(0).unwrap();
        assert!(response.acknowledged());

        let call = transport.last_call().unwrap();
        assert_eq!(call.path, "main/employee/_mapping");
        assert_eq!(
            call.json().unwrap(),
            json!({"employee": {"properties": {
                "name": {"type": "text"},
                "manager": {"type": "object"}
            }}})
        );
    }

    #[test]
    fn test_type_attributes_route_the_request() {
        let (client, transport) = client();
        client.map_from_attributes::<Invoice>(0).unwrap();
        assert_eq!(transport.last_call().unwrap().path, "finance/bill/_mapping");

        client.map_from_attributes_in::<Invoice>("archive", 0).unwrap();
        assert_eq!(transport.last_call().unwrap().path, "archive/bill/_mapping");

        client
            .map_from_attributes_with::<Invoice>("archive", "invoice", 0)
            .unwrap();
        let call = transport.last_call().unwrap();
        assert_eq!(call.path, "archive/invoice/_mapping");
        assert!(call.json().unwrap().get("invoice").is_some());
    }

    #[test]
    fn test_missing_default_index_fails_before_sending() {
        let transport = RecordingTransport::new();
        let client = MappingClient::with_transport(transport.clone(), ClientSettings::default());

        assert!(matches!(
            client.map_from_attributes::<Employee>(0),
            Err(MappingError::InvalidArgument(_))
        ));
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_fluent_defaults_to_type_index() {
        let (client, transport) = client();

        client
            .map_fluent::<Invoice, _>(|d| d.properties(|p| p.double("total", |f| f.store(true))))
            .unwrap();

        let call = transport.last_call().unwrap();
        assert_eq!(call.path, "finance/bill/_mapping");
        assert_eq!(
            call.json().unwrap(),
            json!({"bill": {"properties": {"total": {"type": "double", "store": true}}}})
        );
    }

    #[test]
    fn test_fluent_explicit_options() {
        let (client, transport) = client();

        client
            .map_fluent::<Employee, _>(|d| {
                d.index_name("people")
                    .type_name("staff")
                    .ignore_conflicts(true)
                    .map_from_attributes(0)
            })
            .unwrap();

        assert_eq!(
            transport.last_call().unwrap().path,
            "people/staff/_mapping?ignore_conflicts=true"
        );
    }

    #[test]
    fn test_untyped_fluent_requires_type_name() {
        let (client, transport) = client();

        let result = client.map_fluent_untyped(|d| d.properties(|p| p.text("body", |f| f)));
        assert!(matches!(result, Err(MappingError::InvalidArgument(_))));
        assert_eq!(transport.call_count(), 0);

        client
            .map_fluent_untyped(|d| d.type_name("note").properties(|p| p.text("body", |f| f)))
            .unwrap();
        assert_eq!(transport.last_call().unwrap().path, "main/note/_mapping");
    }

    #[test]
    fn test_map_honors_mapping_options() {
        let (client, transport) = client();

        let mut mapping = RootMapping::new("page")
            .dynamic(DynamicMapping::Strict)
            .field("url", MappingNode::keyword());
        client.map(&mapping).unwrap();
        assert_eq!(transport.last_call().unwrap().path, "main/page/_mapping");

        mapping.index = Some("web".to_string());
        mapping.type_name = Some("document".to_string());
        mapping.ignore_conflicts = true;
        client.map(&mapping).unwrap();

        let call = transport.last_call().unwrap();
        assert_eq!(call.path, "web/document/_mapping?ignore_conflicts=true");
        assert_eq!(call.json().unwrap()["document"]["dynamic"], "strict");
    }

    #[test]
    fn test_map_raw_sends_body_verbatim() {
        let (client, transport) = client();
        let raw = r#"{"tweet":{"properties":{"message":{"type":"text"}}}}"#;

        client.map_raw("tweet", raw, "twitter", false).unwrap();

        let call = transport.last_call().unwrap();
        assert_eq!(call.path, "twitter/tweet/_mapping");
        assert_eq!(call.body, raw);
    }

    #[test]
    fn test_custom_path_resolver() {
        struct Typeless;

        impl PathResolver for Typeless {
            fn index_type_path(&self, index: &str, _type_name: &str, resource: &str) -> String {
                format!("{}/{}", index, resource)
            }
        }

        let (client, transport) = client();
        let client = client.with_path_resolver(Typeless);
        client.map_raw("tweet", "{}", "twitter", true).unwrap();
        assert_eq!(
            transport.last_call().unwrap().path,
            "twitter/_mapping?ignore_conflicts=true"
        );
    }

    #[test]
    fn test_client_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<MappingClient<RecordingTransport>>();
    }
}
