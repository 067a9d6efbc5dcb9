//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_config, ClientConfig};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, RequestConfig};
use crate::pagination::{
    fetch_all_pages_with, FetchOptions, FormTransport, JsonPageExecutor, PageParams, PageRequest,
};
use crate::types::{JsonObject, JsonValue, Method};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Request form built from `--form` plus the paging flags
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CliForm {
    #[serde(flatten)]
    fields: JsonObject,
    #[serde(flatten)]
    paging: PageParams,
}

impl CliForm {
    pub(crate) fn parse(form: Option<&str>, paging: PageParams) -> Result<Self> {
        let mut fields = match form {
            None => JsonObject::new(),
            Some(raw) => match serde_json::from_str::<JsonValue>(raw).context("Invalid --form JSON")? {
                JsonValue::Object(fields) => fields,
                _ => return Err(Error::validation("form")),
            },
        };
        // Paging flags win over form fields of the same name
        fields.remove("page");
        fields.remove("limit");
        Ok(Self { fields, paging })
    }
}

impl PageRequest for CliForm {
    fn page(&self) -> u32 {
        self.paging.page
    }

    fn set_page(&mut self, page: u32) {
        self.paging.page = page;
    }

    fn limit(&self) -> u32 {
        self.paging.limit
    }

    fn set_limit(&mut self, limit: u32) {
        self.paging.limit = limit;
    }

    fn parallel_count(&self) -> usize {
        self.paging.parallel_count
    }
}

/// Parse a `Name: value` header argument
pub(crate) fn parse_header(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw.split_once(':').ok_or_else(|| Error::validation("header"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("header"));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Fetch {
                url,
                method,
                page,
                limit,
                parallel,
                form,
                query,
                cancel_on_error,
            } => {
                let paging = PageParams::new(*page, *limit).with_parallel(*parallel);
                let form = CliForm::parse(form.as_deref(), paging)?;
                let transport = if *query {
                    FormTransport::Query
                } else {
                    FormTransport::Body
                };
                let options = if *cancel_on_error {
                    FetchOptions::new().cancel_on_error()
                } else {
                    FetchOptions::new()
                };
                self.fetch(url, *method, form, transport, options).await
            }
            Commands::Curl {
                url,
                method,
                headers,
                data,
            } => self.curl(url, *method, headers, data.as_deref()),
        }
    }

    /// Load client configuration
    fn load_config(&self) -> Result<ClientConfig> {
        match &self.cli.config {
            Some(path) => load_config(path),
            None => Ok(ClientConfig::default()),
        }
    }

    fn client(&self) -> Result<HttpClient> {
        let config = self.load_config()?;
        debug!("Using client config '{}'", config.label);
        HttpClient::with_config(config.into_http_config())
    }

    async fn fetch(
        &self,
        url: &str,
        method: Method,
        form: CliForm,
        transport: FormTransport,
        options: FetchOptions,
    ) -> Result<()> {
        let client = Arc::new(self.client()?);
        let executor =
            Arc::new(JsonPageExecutor::<JsonValue>::new(client, method, url).with_transport(transport));

        let start = Instant::now();
        let result = fetch_all_pages_with(form, executor, options).await?;

        for item in &result.items {
            self.output(item);
        }
        eprintln!(
            "Fetched {} items from page {} (limit {}, total {}) in {:.2?}",
            result.items.len(),
            result.meta.page,
            result.meta.limit,
            result.meta.total,
            start.elapsed()
        );
        Ok(())
    }

    fn curl(&self, url: &str, method: Method, headers: &[String], data: Option<&str>) -> Result<()> {
        let client = self.client()?;

        let mut config = RequestConfig::new();
        for raw in headers {
            let (name, value) = parse_header(raw)?;
            config = config.header(name, value);
        }
        if let Some(data) = data {
            let body: JsonValue = serde_json::from_str(data).context("Invalid --data JSON")?;
            config = config.json(body);
        }

        println!("{}", client.curl(method, url, &config)?);
        Ok(())
    }

    fn output(&self, item: &JsonValue) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(item).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_cli_form_merges_paging() {
        let form = CliForm::parse(
            Some(r#"{"name": "Anonymous", "page": 99}"#),
            PageParams::new(4, 13).with_parallel(10),
        )
        .unwrap();

        assert_eq!(form.parallel_count(), 10);
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"name": "Anonymous", "page": 4, "limit": 13})
        );
    }

    #[test]
    fn test_cli_form_set_page() {
        let mut form = CliForm::parse(None, PageParams::new(1, 5)).unwrap();
        form.set_page(3);
        assert_eq!(serde_json::to_value(&form).unwrap(), json!({"page": 3, "limit": 5}));
    }

    #[test]
    fn test_cli_form_rejects_non_object() {
        let err = CliForm::parse(Some("[1, 2]"), PageParams::default()).unwrap_err();
        assert_eq!(err.to_string(), "Request is invalid: form");

        assert!(CliForm::parse(Some("{nope"), PageParams::default()).is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": empty").is_err());
    }
}
