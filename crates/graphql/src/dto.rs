//! Wire shapes of the `ListZellerCustomers` operation.

use roster_core::{
    Customer, CustomerId, DirectorySnapshot, FetchError, UserType, LIST_CUSTOMERS_OPERATION,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const LIST_CUSTOMERS_QUERY: &str = r#"query ListZellerCustomers($role: String!) {
  listZellerCustomers(filter: { role: { eq: $role } }) {
    items {
      id
      name
      email
      role
    }
    nextToken
  }
}"#;

#[derive(Debug, Serialize)]
pub struct GraphqlRequest<'a> {
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
    pub query: &'a str,
    pub variables: ListCustomersVariables<'a>,
}

#[derive(Debug, Serialize)]
pub struct ListCustomersVariables<'a> {
    pub role: &'a str,
}

impl GraphqlRequest<'static> {
    pub fn list_customers(role: UserType) -> Self {
        Self {
            operation_name: LIST_CUSTOMERS_OPERATION,
            query: LIST_CUSTOMERS_QUERY,
            variables: ListCustomersVariables { role: role.query_variable() },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    pub data: Option<ListCustomersData>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorDto>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCustomersData {
    pub list_zeller_customers: Option<CustomerConnectionDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerConnectionDto {
    #[serde(default)]
    pub items: Option<Vec<Option<CustomerDto>>>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Every selected field may come back as `null`.
#[derive(Debug, Deserialize)]
pub struct CustomerDto {
    #[serde(default)]
    pub id: Option<CustomerId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl CustomerDto {
    /// Records without an id, name or role cannot be listed and are dropped.
    pub fn into_customer(self) -> Option<Customer> {
        Some(Customer {
            id: self.id?,
            name: self.name?,
            email: self.email.unwrap_or_default(),
            role: self.role?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorDto {
    pub message: String,
}

impl GraphqlResponse {
    pub fn error_messages(&self) -> Option<String> {
        let errors = self.errors.as_ref().filter(|errors| !errors.is_empty())?;
        Some(errors.iter().map(|error| error.message.as_str()).collect::<Vec<_>>().join("; "))
    }

    pub fn into_snapshot(self, role: UserType) -> Result<DirectorySnapshot, FetchError> {
        if let Some(messages) = self.error_messages() {
            return Err(FetchError::graphql(messages));
        }

        let Some(data) = self.data else {
            return Err(FetchError::decode("response carried neither data nor errors"));
        };

        let Some(connection) = data.list_zeller_customers else {
            return Ok(DirectorySnapshot::empty(role));
        };

        let items = connection.items.unwrap_or_default();
        let received = items.len();
        let customers: Vec<Customer> =
            items.into_iter().flatten().filter_map(CustomerDto::into_customer).collect();
        if customers.len() < received {
            debug!(
                event_name = "graphql.response.items_skipped",
                role = role.query_variable(),
                skipped = received - customers.len(),
                "skipped null or incomplete customer records"
            );
        }
        Ok(DirectorySnapshot::new(role, customers, connection.next_token))
    }
}

pub fn decode_snapshot(role: UserType, body: &[u8]) -> Result<DirectorySnapshot, FetchError> {
    let decoded: GraphqlResponse = serde_json::from_slice(body).map_err(|error| {
        FetchError::decode(format!("invalid directory response payload: {error}"))
    })?;
    decoded.into_snapshot(role)
}
