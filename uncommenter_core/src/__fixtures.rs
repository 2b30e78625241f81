use crate::mrcf::Catalogue;

/// A small catalogue with one entry of every shape the resolver consults.
pub const SERVICE_CATALOGUE: &str = r#"{
  "parameters": [
    {
      "path": "/svc/port",
      "format": "integer",
      "mandatory": "mandatory",
      "description": "Service port",
      "recommended_value": 8080,
      "default": 80
    },
    {
      "path": "/svc/image",
      "format": "string",
      "mandatory": "optional",
      "default": "nginx",
      "example": "nginx:1.25"
    },
    {
      "path": "/svc/workers",
      "format": "integer",
      "mandatory": "conditional",
      "default_small_system_profile": 1,
      "default_standard_system_profile": 4,
      "default_large_system_profile": 16
    },
    {
      "path": "/svc/ports[0]/name",
      "format": "string",
      "default": "http"
    },
    {
      "path": "/svc/ports[1]/name",
      "format": "string",
      "default": "https"
    }
  ]
}"#;

/// Helm values mirroring part of [`SERVICE_CATALOGUE`].
pub const SERVICE_VALUES: &str = "\
svc:
  image: {{ .Values.image }}
  timeout: 30
  ports:
    - name: web
      port: 80
    - name: tls
      port: 443
";

/// A commented template mixing data, prose and allow-listed notices.
pub const SERVICE_TEMPLATE: &str = "\
# Service settings
service:
  # type: ClusterIP
  port: 8080
  # annotations:
  #   prometheus.io/scrape: \"true\"
# Important legal notice: do not edit
replicaCount: 1
";

pub fn service_catalogue() -> Catalogue {
	Catalogue::from_json(SERVICE_CATALOGUE)
		.unwrap_or_else(|e| panic!("fixture catalogue should load: {e}"))
}
