//! Vocabulary of the generated script.
//!
//! Element and attribute names of the streaming-transformation engine's
//! script format, plus the reserved identifiers the model layer uses to wire
//! transformation parameters.

pub const ELEMENT_ROOT: &str = "metamorph";
pub const ELEMENT_META: &str = "meta";
pub const ELEMENT_META_NAME: &str = "name";
pub const ELEMENT_RULES: &str = "rules";
pub const ELEMENT_MAPS: &str = "maps";
pub const ELEMENT_DATA: &str = "data";
pub const ELEMENT_ENTITY: &str = "entity";
pub const ELEMENT_MAP: &str = "map";
pub const ELEMENT_MAP_ENTRY: &str = "entry";
pub const ELEMENT_COMBINE: &str = "combine";
pub const ELEMENT_CHOOSE: &str = "choose";
pub const ELEMENT_IF: &str = "if";
pub const ELEMENT_ALL: &str = "all";
pub const ELEMENT_OCCURRENCE: &str = "occurrence";
pub const ELEMENT_REGEXP: &str = "regexp";
pub const ELEMENT_NUMERIC: &str = "numeric";
pub const ELEMENT_EQUALS: &str = "equals";
pub const ELEMENT_NOT_EQUALS: &str = "not-equals";
pub const ELEMENT_SQLMAP: &str = "sqlmap";

pub const ATTR_SOURCE: &str = "source";
pub const ATTR_NAME: &str = "name";
pub const ATTR_VALUE: &str = "value";
pub const ATTR_RESET: &str = "reset";
pub const ATTR_FLUSH_WITH: &str = "flushWith";
pub const ATTR_SAME_ENTITY: &str = "sameEntity";
pub const ATTR_INCLUDE_SUB_ENTITIES: &str = "includeSubEntities";
pub const ATTR_MATCH: &str = "match";
pub const ATTR_EXPRESSION: &str = "expression";
pub const ATTR_STRING: &str = "string";
pub const ATTR_ONLY: &str = "only";
pub const ATTR_LOOKUP_IN: &str = "in";
pub const ATTR_LOOKUP_MAP: &str = "map";
pub const ATTR_ENTITY_MARKER: &str = "entityMarker";
pub const ATTR_VERSION: &str = "version";

pub const SCRIPT_NAMESPACE: &str = "http://www.culturegraph.org/metamorph";
pub const SCRIPT_VERSION: &str = "1";
pub const BOOLEAN_TRUE: &str = "true";

/// Function names of the builtins with dedicated code generation.
pub const FUNCTION_CONCAT: &str = "concat";
pub const FUNCTION_COLLECT: &str = "collect";
pub const FUNCTION_MULTI_COLLECT: &str = "multi-collect";
pub const FUNCTION_IFELSE: &str = "ifelse";
pub const FUNCTION_ALL: &str = "all";
pub const FUNCTION_LOOKUP: &str = "lookup";
pub const FUNCTION_REGEXLOOKUP: &str = "regexlookup";
pub const FUNCTION_SETREPLACE: &str = "setreplace";
pub const FUNCTION_WHITELIST: &str = "whitelist";
pub const FUNCTION_BLACKLIST: &str = "blacklist";
pub const FUNCTION_SQLMAP: &str = "sqlmap";

/// Reserved parameter naming a component's comma-separated input variables.
pub const PARAM_INPUT_STRING: &str = "inputString";
/// Reserved parameter carrying a lookup component's table payload as JSON.
pub const PARAM_LOOKUP_STRING: &str = "lookupString";
pub const PARAM_IF: &str = "if";
pub const PARAM_ELSE: &str = "else";
pub const PARAM_DELIMITER: &str = "delimiter";
pub const PARAM_PREFIX: &str = "prefix";
pub const PARAM_POSTFIX: &str = "postfix";

/// Prefix marking a transformation parameter key as the output variable.
pub const OUTPUT_VARIABLE_PREFIX: &str = "__TRANSFORMATION_OUTPUT_VARIABLE__";
/// Suffix of the staging variable feeding an occurrence selection.
pub const OCCURRENCE_VARIABLE_POSTFIX: &str = ".occurrence";
/// Prefix of per-mapping identifiers in the script's meta section.
pub const MAPPING_META_PREFIX: &str = "mapping";
