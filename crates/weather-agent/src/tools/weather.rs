use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;
use weather_agent_core::tool::{Error as ToolError, Tool, ToolResult};
use weather_agent_fetch::{
    BatchError, BatchFetcher, FieldPath, RecordKeys, Transport, UrlTemplate,
};

const WTTR_BASE_URL: &str = "https://wttr.in/";
const WTTR_QUERY: &str = "format=j1";

/// Arguments of the weather tools.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct WeatherParameters {
    /// Cities to look up.
    #[schemars(
        title = "Cities",
        description = "The cities to look up, e.g. [\"LA\", \"NY\"]."
    )]
    pub cities: Vec<String>,
}

/// A tool that looks up one temperature field of several cities on wttr.in.
///
/// Every city yields one record in the tool output, in the order of the
/// input. A city that can't be looked up is reported as
/// `{"city": "<city> ERROR", "<key>": 0}`.
pub struct WeatherTool<T> {
    name: &'static str,
    description: &'static str,
    fetcher: BatchFetcher<T>,
    parameter_schema: Value,
}

impl<T: Transport> WeatherTool<T> {
    /// Creates the `current_temperature` tool.
    pub fn current_temperature(transport: T) -> Self {
        Self::new(
            "current_temperature",
            "Provides the current temperature information for the given \
             cities. The parameter cities is a list, e.g. [\"LA\", \"NY\"].",
            transport,
            "current_condition[0].temp_C",
            "temperature",
        )
    }

    /// Creates the `today_maximal_temperature` tool.
    pub fn today_maximal_temperature(transport: T) -> Self {
        Self::new(
            "today_maximal_temperature",
            "Provides the maximal temperature for today for the given \
             cities. The parameter cities is a list, e.g. [\"LA\", \"NY\"].",
            transport,
            "weather[0].maxtempC",
            "temperature_max",
        )
    }

    fn new(
        name: &'static str,
        description: &'static str,
        transport: T,
        field_path: &str,
        result_field: &str,
    ) -> Self {
        let template =
            UrlTemplate::new(WTTR_BASE_URL).expect("base URL is invalid");
        let field_path =
            FieldPath::parse(field_path).expect("field path is invalid");
        let fetcher = BatchFetcher::new(
            transport,
            template.with_query(WTTR_QUERY),
            field_path,
            RecordKeys::new("city", result_field),
        );
        Self {
            name,
            description,
            fetcher,
            parameter_schema: schema_for!(WeatherParameters).to_value(),
        }
    }

    /// Replaces the underlying fetcher configuration, e.g. to enable
    /// concurrent requests or the strict failure policy.
    pub fn map_fetcher<F>(mut self, f: F) -> Self
    where
        F: FnOnce(BatchFetcher<T>) -> BatchFetcher<T>,
    {
        self.fetcher = f(self.fetcher);
        self
    }

    /// Looks up `cities` directly, without going through a model.
    pub async fn invoke<I, S>(
        &self,
        cities: I,
    ) -> Result<Vec<Value>, BatchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.fetcher.fetch_records(cities).await
    }
}

impl<T: Transport> Tool for WeatherTool<T> {
    type Input = WeatherParameters;

    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: WeatherParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let fetcher = self.fetcher.clone();
        async move {
            let records =
                fetcher.fetch_records(input.cities).await.map_err(|err| {
                    ToolError::execution_error().with_reason(err.to_string())
                })?;
            Ok(Value::Array(records).to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use serde_json::json;
    use weather_agent_fetch::FailurePolicy;
    use weather_agent_fetch::testing::StaticTransport;

    use super::*;

    fn wttr_body(temp_c: &str, max_temp_c: &str) -> String {
        json!({
            "current_condition": [{ "temp_C": temp_c, "humidity": "71" }],
            "weather": [
                { "maxtempC": max_temp_c, "mintempC": "3" },
                { "maxtempC": "99", "mintempC": "3" }
            ]
        })
        .to_string()
    }

    fn transport() -> StaticTransport {
        let transport = StaticTransport::default();
        transport
            .respond(
                "https://wttr.in/Berlin?format=j1",
                200,
                wttr_body("12", "15"),
            )
            .respond("https://wttr.in/NY?format=j1", 200, wttr_body("18", "22"))
            .respond("https://wttr.in/Paris?format=j1", 503, "busy");
        transport
    }

    #[test]
    fn test_schema() {
        let tool = WeatherTool::today_maximal_temperature(transport());
        assert_eq!(tool.name(), "today_maximal_temperature");

        let schema = tool.parameter_schema();
        assert_eq!(schema["properties"]["cities"]["title"], "Cities");
        assert_eq!(schema["properties"]["cities"]["type"], "array");
        assert_eq!(schema["required"], json!(["cities"]));
    }

    #[tokio::test]
    async fn test_invoke_maximal_temperature() {
        let tool = WeatherTool::today_maximal_temperature(transport());
        let records = tool.invoke(["Berlin", "NY", "Paris"]).await.unwrap();
        assert_eq!(
            records,
            [
                json!({ "city": "Berlin", "temperature_max": "15" }),
                json!({ "city": "NY", "temperature_max": "22" }),
                json!({ "city": "Paris ERROR", "temperature_max": 0 }),
            ]
        );
    }

    #[tokio::test]
    async fn test_execute_current_temperature() {
        let tool = WeatherTool::current_temperature(transport())
            .map_fetcher(|f| {
                f.with_max_in_flight(NonZeroUsize::new(2).unwrap())
            });
        let output = tool
            .execute(WeatherParameters {
                cities: vec!["NY".to_owned(), "Berlin".to_owned()],
            })
            .await
            .unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&output).unwrap(),
            json!([
                { "city": "NY", "temperature": "18" },
                { "city": "Berlin", "temperature": "12" }
            ])
        );
    }

    #[tokio::test]
    async fn test_strict_failure_is_execution_error() {
        let transport = transport();
        transport.respond("https://wttr.in/Oslo?format=j1", 200, "<html>");
        let tool = WeatherTool::current_temperature(transport)
            .map_fetcher(|f| f.with_policy(FailurePolicy::Strict));
        let err = tool
            .execute(WeatherParameters {
                cities: vec!["Oslo".to_owned()],
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.kind(),
            weather_agent_core::tool::ErrorKind::ExecutionError
        );
    }
}
