// ABOUTME: HttpFoundry implements the capability traits against the /v3 REST API.
// ABOUTME: Decodes JSON bodies, X-Cf-Warnings headers, and platform error documents.

use super::error::FoundryError;
use super::models::{
    Application, Build, Deployment, Droplet, EnvironmentPatch, Lifecycle, Package, PackageSource,
    Process, ProcessInstance, Reply,
};
use super::session::Session;
use super::traits::{
    AppOps, BuildOps, DeploymentOps, DropletOps, FoundryResult, PackageOps, ProcessOps,
};
use super::wire::{
    AppDoc, BuildDoc, DeploymentDoc, DropletDoc, ErrorsDoc, InstanceDoc, List, PackageDoc,
    ProcessDoc,
};
use crate::types::{
    AppGuid, BuildGuid, DeploymentGuid, DropletGuid, Guid, LifecycleType, PackageGuid,
    ProcessGuid,
};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;

const WARNINGS_HEADER: &str = "x-cf-warnings";

/// Platform client for the /v3 API over a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFoundry {
    session: Arc<Session>,
}

enum Body {
    Empty,
    Json(Value),
    /// Package bits sent as a multipart form.
    Bits(Bytes),
}

struct ApiResponse {
    status: StatusCode,
    warnings: Vec<String>,
    body: Bytes,
}

impl HttpFoundry {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Body,
    ) -> Result<ApiResponse, FoundryError> {
        let session = &self.session;
        let url = session.url_for(path);
        tracing::debug!(%method, %url, "API request");

        let request = session
            .client()
            .request(method.clone(), &url)
            .header(AUTHORIZATION, session.authorization())
            .header(ACCEPT, "application/json");
        let request = match body {
            Body::Empty => request,
            Body::Json(value) => request.json(&value),
            Body::Bits(bits) => request.multipart(bits_form(bits)?),
        };

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(session, &method, &url, e))?;
        let status = response.status();
        let warnings = parse_warnings(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(session, &method, &url, e))?;

        tracing::debug!(%method, %url, status = status.as_u16(), "API response");
        Ok(ApiResponse {
            status,
            warnings,
            body,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Body,
        resource: &str,
    ) -> FoundryResult<T> {
        let response = self.exchange(method, path, body).await?;
        if !response.status.is_success() {
            return Err(error_for(response.status, &response.body, resource));
        }
        let value = serde_json::from_slice(&response.body)
            .map_err(|e| FoundryError::Decode(format!("{resource}: {e}")))?;
        Ok(Reply::with_warnings(value, response.warnings))
    }

    /// For endpoints whose response body cfrollout does not need.
    async fn call_discarding(
        &self,
        method: Method,
        path: &str,
        body: Body,
        resource: &str,
    ) -> FoundryResult<()> {
        let response = self.exchange(method, path, body).await?;
        if !response.status.is_success() {
            return Err(error_for(response.status, &response.body, resource));
        }
        Ok(Reply::with_warnings((), response.warnings))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, resource: &str) -> FoundryResult<T> {
        self.call(Method::GET, path, Body::Empty, resource).await
    }
}

fn seg<T>(guid: &Guid<T>) -> String {
    urlencoding::encode(guid.as_str()).into_owned()
}

fn map_reply<D, T: From<D>>(reply: Reply<D>) -> Reply<T> {
    Reply::with_warnings(T::from(reply.value), reply.warnings)
}

/// Split and percent-decode every `X-Cf-Warnings` header value.
fn parse_warnings(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(WARNINGS_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(|w| {
            urlencoding::decode(&w.replace('+', " "))
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| w.to_string())
        })
        .collect()
}

fn error_for(status: StatusCode, body: &[u8], resource: &str) -> FoundryError {
    let first = serde_json::from_slice::<ErrorsDoc>(body)
        .ok()
        .and_then(|doc| doc.errors.into_iter().next());
    let (title, detail) = match first {
        Some(err) => (err.title, err.detail),
        None => (
            status.canonical_reason().unwrap_or("error").to_string(),
            String::from_utf8_lossy(body).trim().to_string(),
        ),
    };

    match status {
        StatusCode::NOT_FOUND => FoundryError::not_found(resource),
        StatusCode::UNAUTHORIZED => FoundryError::Unauthorized(if detail.is_empty() {
            title
        } else {
            detail
        }),
        _ => FoundryError::Api {
            status: status.as_u16(),
            title,
            detail,
        },
    }
}

fn transport_error(
    session: &Session,
    method: &Method,
    url: &str,
    err: reqwest::Error,
) -> FoundryError {
    if err.is_timeout() {
        FoundryError::Transport(format!(
            "{method} {url} timed out after {:?}",
            session.request_timeout()
        ))
    } else {
        FoundryError::Transport(format!("{method} {url}: {err}"))
    }
}

fn bits_form(bits: Bytes) -> Result<Form, FoundryError> {
    let part = Part::bytes(Vec::from(bits))
        .file_name("package.zip")
        .mime_str("application/zip")
        .map_err(|e| FoundryError::InvalidRequest(format!("package bits: {e}")))?;
    Ok(Form::new().text("resources", "[]").part("bits", part))
}

fn package_body(app: &AppGuid, source: &PackageSource) -> Value {
    let relationships = json!({ "app": { "data": { "guid": app.as_str() } } });
    match source {
        PackageSource::Bits => json!({ "type": "bits", "relationships": relationships }),
        PackageSource::Docker { image, credentials } => {
            let mut data = json!({ "image": image.as_str() });
            if let Some(creds) = credentials {
                data["username"] = json!(creds.username);
                data["password"] = json!(creds.password);
            }
            json!({ "type": "docker", "data": data, "relationships": relationships })
        }
    }
}

fn lifecycle_body(lifecycle: &Lifecycle) -> Value {
    let data = match lifecycle.kind {
        LifecycleType::Docker => json!({}),
        LifecycleType::Buildpack | LifecycleType::Kpack => {
            let mut data = json!({ "buildpacks": lifecycle.buildpacks });
            if let Some(stack) = &lifecycle.stack {
                data["stack"] = json!(stack);
            }
            data
        }
    };
    json!({ "lifecycle": { "type": lifecycle.kind.as_str(), "data": data } })
}

#[async_trait]
impl PackageOps for HttpFoundry {
    async fn create_package(
        &self,
        app: &AppGuid,
        source: &PackageSource,
    ) -> FoundryResult<Package> {
        self.call::<PackageDoc>(
            Method::POST,
            "/v3/packages",
            Body::Json(package_body(app, source)),
            &format!("app {app}"),
        )
        .await
        .map(map_reply)
    }

    async fn upload_package_bits(
        &self,
        package: &PackageGuid,
        bits: Bytes,
    ) -> FoundryResult<Package> {
        tracing::debug!(%package, size = bits.len(), "uploading package bits");
        self.call::<PackageDoc>(
            Method::POST,
            &format!("/v3/packages/{}/upload", seg(package)),
            Body::Bits(bits),
            &format!("package {package}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_package(&self, package: &PackageGuid) -> FoundryResult<Package> {
        self.get::<PackageDoc>(
            &format!("/v3/packages/{}", seg(package)),
            &format!("package {package}"),
        )
        .await
        .map(map_reply)
    }
}

#[async_trait]
impl BuildOps for HttpFoundry {
    async fn create_build(&self, package: &PackageGuid) -> FoundryResult<Build> {
        self.call::<BuildDoc>(
            Method::POST,
            "/v3/builds",
            Body::Json(json!({ "package": { "guid": package.as_str() } })),
            &format!("package {package}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_build(&self, build: &BuildGuid) -> FoundryResult<Build> {
        self.get::<BuildDoc>(
            &format!("/v3/builds/{}", seg(build)),
            &format!("build {build}"),
        )
        .await
        .map(map_reply)
    }
}

#[async_trait]
impl DropletOps for HttpFoundry {
    async fn get_droplet(&self, droplet: &DropletGuid) -> FoundryResult<Droplet> {
        self.get::<DropletDoc>(
            &format!("/v3/droplets/{}", seg(droplet)),
            &format!("droplet {droplet}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_current_droplet(&self, app: &AppGuid) -> FoundryResult<Option<Droplet>> {
        let result = self
            .get::<DropletDoc>(
                &format!("/v3/apps/{}/droplets/current", seg(app)),
                &format!("current droplet of app {app}"),
            )
            .await;
        match result {
            Ok(reply) => Ok(Reply::with_warnings(
                Some(Droplet::from(reply.value)),
                reply.warnings,
            )),
            Err(e) if e.is_not_found() => Ok(Reply::new(None)),
            Err(e) => Err(e),
        }
    }

    async fn set_current_droplet(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
    ) -> FoundryResult<()> {
        self.call_discarding(
            Method::PATCH,
            &format!("/v3/apps/{}/relationships/current_droplet", seg(app)),
            Body::Json(json!({ "data": { "guid": droplet.as_str() } })),
            &format!("app {app}"),
        )
        .await
    }
}

#[async_trait]
impl DeploymentOps for HttpFoundry {
    async fn create_deployment(
        &self,
        app: &AppGuid,
        droplet: &DropletGuid,
    ) -> FoundryResult<Deployment> {
        let body = json!({
            "droplet": { "guid": droplet.as_str() },
            "relationships": { "app": { "data": { "guid": app.as_str() } } },
        });
        self.call::<DeploymentDoc>(
            Method::POST,
            "/v3/deployments",
            Body::Json(body),
            &format!("app {app}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_deployment(&self, deployment: &DeploymentGuid) -> FoundryResult<Deployment> {
        self.get::<DeploymentDoc>(
            &format!("/v3/deployments/{}", seg(deployment)),
            &format!("deployment {deployment}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_new_processes(&self, deployment: &DeploymentGuid) -> FoundryResult<Vec<Process>> {
        let doc = self
            .get::<DeploymentDoc>(
                &format!("/v3/deployments/{}", seg(deployment)),
                &format!("deployment {deployment}"),
            )
            .await?;
        let mut warnings = doc.warnings;
        let mut processes = Vec::with_capacity(doc.value.new_processes.len());
        for guid in doc.value.new_process_guids() {
            let reply = self.get_process(&guid).await?;
            warnings.extend(reply.warnings);
            processes.push(reply.value);
        }
        Ok(Reply::with_warnings(processes, warnings))
    }
}

#[async_trait]
impl ProcessOps for HttpFoundry {
    async fn get_application_processes(&self, app: &AppGuid) -> FoundryResult<Vec<Process>> {
        let reply = self
            .get::<List<ProcessDoc>>(
                &format!("/v3/apps/{}/processes?per_page=5000", seg(app)),
                &format!("app {app}"),
            )
            .await?;
        Ok(Reply::with_warnings(
            reply.value.resources.into_iter().map(Process::from).collect(),
            reply.warnings,
        ))
    }

    async fn get_process(&self, process: &ProcessGuid) -> FoundryResult<Process> {
        self.get::<ProcessDoc>(
            &format!("/v3/processes/{}", seg(process)),
            &format!("process {process}"),
        )
        .await
        .map(map_reply)
    }

    async fn get_process_instances(
        &self,
        process: &ProcessGuid,
    ) -> FoundryResult<Vec<ProcessInstance>> {
        let reply = self
            .get::<List<InstanceDoc>>(
                &format!("/v3/processes/{}/stats", seg(process)),
                &format!("process {process}"),
            )
            .await?;
        Ok(Reply::with_warnings(
            reply
                .value
                .resources
                .into_iter()
                .map(ProcessInstance::from)
                .collect(),
            reply.warnings,
        ))
    }
}

#[async_trait]
impl AppOps for HttpFoundry {
    async fn get_application(&self, app: &AppGuid) -> FoundryResult<Application> {
        self.get::<AppDoc>(&format!("/v3/apps/{}", seg(app)), &format!("app {app}"))
            .await
            .map(map_reply)
    }

    async fn start_application(&self, app: &AppGuid) -> FoundryResult<Application> {
        self.call::<AppDoc>(
            Method::POST,
            &format!("/v3/apps/{}/actions/start", seg(app)),
            Body::Empty,
            &format!("app {app}"),
        )
        .await
        .map(map_reply)
    }

    async fn stop_application(&self, app: &AppGuid) -> FoundryResult<Application> {
        self.call::<AppDoc>(
            Method::POST,
            &format!("/v3/apps/{}/actions/stop", seg(app)),
            Body::Empty,
            &format!("app {app}"),
        )
        .await
        .map(map_reply)
    }

    async fn update_lifecycle(
        &self,
        app: &AppGuid,
        lifecycle: &Lifecycle,
    ) -> FoundryResult<Application> {
        self.call::<AppDoc>(
            Method::PATCH,
            &format!("/v3/apps/{}", seg(app)),
            Body::Json(lifecycle_body(lifecycle)),
            &format!("app {app}"),
        )
        .await
        .map(map_reply)
    }

    async fn update_environment(
        &self,
        app: &AppGuid,
        patch: &EnvironmentPatch,
    ) -> FoundryResult<()> {
        self.call_discarding(
            Method::PATCH,
            &format!("/v3/apps/{}/environment_variables", seg(app)),
            Body::Json(json!({ "var": patch })),
            &format!("app {app}"),
        )
        .await
    }
}
