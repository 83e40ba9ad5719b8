// specialists.rs — The four concrete specialist definitions.
//
// Prompt contracts: the data-query specialist carries the SQL dialect
// rules plus per-tenant vocabulary; the documentation specialist is
// search-only; the workspace specialist operates through the review
// pipeline; the analysis specialist has no tools and interprets prior
// data. Tool subsets are drawn from the catalog in sanitized-name form.

use sp_llm::ToolSpec;
use sp_tools::{sanitize_tool_name, ToolCatalog};

use crate::spec::AgentSpec;

/// The agent names the coordinator may dispatch.
pub const AGENT_NAMES: &[&str] = &["suiteql", "rag", "workspace", "analysis"];

fn catalog_tools(catalog: &ToolCatalog, names: &[&str]) -> Vec<ToolSpec> {
    names
        .iter()
        .filter_map(|name| catalog.get(name))
        .map(|descriptor| ToolSpec {
            name: sanitize_tool_name(descriptor.name),
            description: descriptor.description.to_string(),
            input_schema: descriptor.input_schema(),
        })
        .collect()
}

/// The data-query specialist.
///
/// `field_catalogue` and `vernacular` are tenant-specific blocks built at
/// dispatch time; either may be empty.
pub fn suiteql_spec(catalog: &ToolCatalog, field_catalogue: &str, vernacular: &str) -> AgentSpec {
    let mut prompt = String::from(
        "You are a SuiteQL engineer answering data questions against a NetSuite account.\n\
         \n\
         DIALECT RULES:\n\
         - SuiteQL does not support CTEs (WITH clauses). Use subqueries.\n\
         - Always include a row-limit clause (ROWNUM or FETCH FIRST n ROWS ONLY).\n\
         - Use BUILTIN.DF() for display values and NVL() for null handling.\n\
         - Dates: use TO_DATE or relative ranges; never bare string comparisons.\n\
         \n\
         PROCESS:\n\
         - Discover schema with the sample-table tool when unsure of columns.\n\
         - Run the query with the suiteql tool, then answer from its rows.\n\
         - Never fabricate rows. If a query fails, fix it and retry within your step budget.\n",
    );
    if !field_catalogue.is_empty() {
        prompt.push_str("\nCUSTOM FIELDS:\n");
        prompt.push_str(field_catalogue);
        prompt.push('\n');
    }
    if !vernacular.is_empty() {
        prompt.push_str("\nTENANT VOCABULARY:\n");
        prompt.push_str(vernacular);
        prompt.push('\n');
    }

    AgentSpec::new("suiteql", prompt).with_tools(catalog_tools(
        catalog,
        &[
            "netsuite.suiteql",
            "netsuite.connectivity",
            "data.sample_table_read",
        ],
    ))
}

/// The documentation specialist. Search tools (knowledge base, web) are
/// supplied by the caller since they come from external connectors.
pub fn rag_spec(search_tools: Vec<ToolSpec>) -> AgentSpec {
    AgentSpec::new(
        "rag",
        "You are a NetSuite documentation assistant.\n\
         \n\
         RULES:\n\
         - You answer how-to, syntax, API, and error-code questions.\n\
         - You never modify anything; you only search and summarize.\n\
         - Cite which source a statement came from when sources disagree.\n\
         - If the documentation does not cover the question, say so plainly.\n",
    )
    .with_tools(search_tools)
}

/// The workspace development specialist.
pub fn workspace_spec(catalog: &ToolCatalog) -> AgentSpec {
    AgentSpec::new(
        "workspace",
        "You are a SuiteScript workspace assistant.\n\
         \n\
         RULES:\n\
         - Read and search files before proposing changes.\n\
         - All modifications go through propose_patch as unified diffs; \
           never claim to have changed a file directly.\n\
         - Keep proposed diffs minimal and explain the rationale.\n",
    )
    .with_tools(catalog_tools(
        catalog,
        &[
            "workspace.list_files",
            "workspace.read_file",
            "workspace.search",
            "workspace.propose_patch",
        ],
    ))
    .with_max_steps(4)
}

/// The analysis specialist: no tools, interprets prior agent data.
pub fn analysis_spec() -> AgentSpec {
    AgentSpec::new(
        "analysis",
        "You are a financial data analyst.\n\
         \n\
         RULES:\n\
         - Work only from the data in <prior_agent_results>; never invent numbers.\n\
         - Surface trends, comparisons, and outliers with exact figures.\n\
         - Note data gaps that limit the analysis.\n",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suiteql_spec_carries_query_tools_and_vocabulary() {
        let catalog = ToolCatalog::new();
        let spec = suiteql_spec(
            &catalog,
            "- custbody_channel (Sales Channel)",
            "- \"Sales Channel\" → custbody_channel",
        );
        assert_eq!(spec.name, "suiteql");
        assert!(spec.tools.iter().any(|t| t.name == "netsuite_suiteql"));
        assert!(spec.system_prompt.contains("TENANT VOCABULARY"));
        assert!(spec.system_prompt.contains("custbody_channel"));
        assert!(spec.system_prompt.contains("FETCH FIRST"));
    }

    #[test]
    fn analysis_spec_is_toolless() {
        assert!(analysis_spec().tools.is_empty());
    }

    #[test]
    fn workspace_spec_has_no_query_execution_tools() {
        let catalog = ToolCatalog::new();
        let spec = workspace_spec(&catalog);
        assert!(spec.tools.iter().all(|t| !t.name.contains("suiteql")));
        assert!(spec.tools.iter().any(|t| t.name == "workspace_propose_patch"));
    }

    #[test]
    fn agent_names_cover_the_specialists() {
        assert_eq!(AGENT_NAMES, &["suiteql", "rag", "workspace", "analysis"]);
    }
}
