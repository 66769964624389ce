//! Static catalog of known DAX functions.
//!
//! The table below is metadata only (name, arity, one-line description); it
//! drives the analyzer's unknown-function and argument-count checks and
//! editor completion. It is constructed once and shared read-only: the
//! registry is built lazily behind a [`OnceLock`] and never mutated after
//! initialization.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Sentinel for functions with no upper argument limit.
pub const VAR_ARGS: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub description: &'static str,
}

impl FunctionSpec {
    /// True when `count` arguments satisfy this signature.
    #[must_use]
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && count <= self.max_args
    }
}

macro_rules! spec {
    ($name:literal, $min:expr, $max:expr, $desc:literal) => {
        FunctionSpec {
            name: $name,
            min_args: $min,
            max_args: $max,
            description: $desc,
        }
    };
}

#[rustfmt::skip]
const BUILTINS: &[FunctionSpec] = &[
    // Aggregation.
    spec!("SUM", 1, 1, "Adds all the numbers in a column"),
    spec!("SUMX", 2, 2, "Sums an expression evaluated for each row of a table"),
    spec!("AVERAGE", 1, 1, "Arithmetic mean of a column"),
    spec!("AVERAGEX", 2, 2, "Mean of an expression evaluated for each row of a table"),
    spec!("MIN", 1, 2, "Smallest value in a column, or the smaller of two expressions"),
    spec!("MINX", 2, 2, "Minimum of an expression evaluated for each row of a table"),
    spec!("MAX", 1, 2, "Largest value in a column, or the larger of two expressions"),
    spec!("MAXX", 2, 2, "Maximum of an expression evaluated for each row of a table"),
    spec!("COUNT", 1, 1, "Counts numeric values in a column"),
    spec!("COUNTA", 1, 1, "Counts non-blank values in a column"),
    spec!("COUNTX", 2, 2, "Counts numeric results of an expression over a table"),
    spec!("COUNTAX", 2, 2, "Counts non-blank results of an expression over a table"),
    spec!("COUNTROWS", 1, 1, "Number of rows in a table"),
    spec!("COUNTBLANK", 1, 1, "Counts blank values in a column"),
    spec!("DISTINCTCOUNT", 1, 1, "Number of distinct values in a column"),
    spec!("DISTINCTCOUNTNOBLANK", 1, 1, "Distinct values in a column, ignoring blanks"),
    spec!("PRODUCT", 1, 1, "Product of the numbers in a column"),
    spec!("PRODUCTX", 2, 2, "Product of an expression evaluated for each row of a table"),
    spec!("DIVIDE", 2, 3, "Division with an alternate result on division by zero"),

    // Filter context.
    spec!("CALCULATE", 1, VAR_ARGS, "Evaluates an expression in a modified filter context"),
    spec!("CALCULATETABLE", 1, VAR_ARGS, "Evaluates a table expression in a modified filter context"),
    spec!("FILTER", 2, 2, "Rows of a table matching a predicate"),
    spec!("ALL", 1, VAR_ARGS, "Removes filters from tables or columns"),
    spec!("ALLEXCEPT", 2, VAR_ARGS, "Removes all filters except those on the listed columns"),
    spec!("ALLSELECTED", 0, VAR_ARGS, "Removes inner filters while keeping explicit outer ones"),
    spec!("ALLNOBLANKROW", 1, VAR_ARGS, "ALL without the relationship blank row"),
    spec!("KEEPFILTERS", 1, 1, "Intersects new filters with the existing filter context"),
    spec!("REMOVEFILTERS", 0, VAR_ARGS, "Clears filters from tables or columns"),
    spec!("USERELATIONSHIP", 2, 2, "Activates an inactive relationship for one evaluation"),
    spec!("CROSSFILTER", 3, 3, "Overrides a relationship's cross-filter direction"),
    spec!("TREATAS", 2, VAR_ARGS, "Applies the result of a table expression as filters on columns"),
    spec!("SELECTEDVALUE", 1, 2, "The single selected value of a column, or an alternate"),
    spec!("EARLIER", 1, 2, "Value of a column in an outer row context"),
    spec!("EARLIEST", 1, 1, "Value of a column in the outermost row context"),
    spec!("RELATED", 1, 1, "Related value from the one side of a relationship"),
    spec!("RELATEDTABLE", 1, 1, "Related rows from the many side of a relationship"),
    spec!("LOOKUPVALUE", 3, VAR_ARGS, "Value of a column for the row matching search criteria"),

    // Table functions.
    spec!("VALUES", 1, 1, "Distinct values of a column, including the blank row"),
    spec!("DISTINCT", 1, 1, "Distinct values of a column or table"),
    spec!("SUMMARIZE", 2, VAR_ARGS, "Groups a table by columns with optional aggregations"),
    spec!("SUMMARIZECOLUMNS", 1, VAR_ARGS, "Groups columns with filters and aggregations"),
    spec!("ADDCOLUMNS", 3, VAR_ARGS, "Adds calculated columns to a table expression"),
    spec!("SELECTCOLUMNS", 2, VAR_ARGS, "Projects named expressions from a table"),
    spec!("TOPN", 2, VAR_ARGS, "The top N rows of a table by an ordering expression"),
    spec!("ROW", 2, VAR_ARGS, "A single-row table from name/expression pairs"),
    spec!("DATATABLE", 3, VAR_ARGS, "An inline table from literal values"),
    spec!("UNION", 2, VAR_ARGS, "Union of tables with matching column counts"),
    spec!("EXCEPT", 2, 2, "Rows of the first table not present in the second"),
    spec!("INTERSECT", 2, 2, "Rows present in both tables"),
    spec!("CROSSJOIN", 2, VAR_ARGS, "Cartesian product of tables"),
    spec!("GENERATE", 2, 2, "Cross-applies a table expression to each row"),
    spec!("GENERATEALL", 2, 2, "GENERATE keeping rows with empty second-table results"),
    spec!("GENERATESERIES", 2, 3, "A one-column table of values in an interval"),
    spec!("NATURALINNERJOIN", 2, 2, "Inner join on common columns"),
    spec!("NATURALLEFTOUTERJOIN", 2, 2, "Left outer join on common columns"),
    spec!("GROUPBY", 1, VAR_ARGS, "Groups a table using CURRENTGROUP aggregations"),
    spec!("CURRENTGROUP", 0, 0, "The current group's rows inside GROUPBY"),
    spec!("ROLLUP", 1, VAR_ARGS, "Adds subtotal rows to SUMMARIZE group-by columns"),
    spec!("ROLLUPGROUP", 1, VAR_ARGS, "Groups columns for a single subtotal level"),
    spec!("IGNORE", 1, VAR_ARGS, "Excludes measures from SUMMARIZECOLUMNS blank-row logic"),

    // Logical.
    spec!("IF", 2, 3, "Branches on a condition"),
    spec!("IFERROR", 2, 2, "Alternate result when an expression errors"),
    spec!("SWITCH", 3, VAR_ARGS, "Matches an expression against value/result pairs"),
    spec!("AND", 2, 2, "Logical conjunction of two expressions"),
    spec!("OR", 2, 2, "Logical disjunction of two expressions"),
    spec!("NOT", 1, 1, "Logical negation"),
    spec!("COALESCE", 2, VAR_ARGS, "First non-blank expression"),
    spec!("TRUE", 0, 0, "The logical value TRUE"),
    spec!("FALSE", 0, 0, "The logical value FALSE"),
    spec!("ERROR", 1, 1, "Raises a user-defined error"),

    // Information.
    spec!("ISBLANK", 1, 1, "Whether a value is blank"),
    spec!("ISERROR", 1, 1, "Whether an expression evaluates to an error"),
    spec!("ISEMPTY", 1, 1, "Whether a table has no rows"),
    spec!("ISNUMBER", 1, 1, "Whether a value is numeric"),
    spec!("ISTEXT", 1, 1, "Whether a value is text"),
    spec!("ISNONTEXT", 1, 1, "Whether a value is not text"),
    spec!("ISLOGICAL", 1, 1, "Whether a value is a logical"),
    spec!("ISEVEN", 1, 1, "Whether a number is even"),
    spec!("ISODD", 1, 1, "Whether a number is odd"),
    spec!("ISSUBTOTAL", 1, 1, "Whether the row is a ROLLUP subtotal for a column"),
    spec!("HASONEVALUE", 1, 1, "Whether a column has exactly one visible value"),
    spec!("HASONEFILTER", 1, 1, "Whether a column has exactly one direct filter value"),
    spec!("ISFILTERED", 1, 1, "Whether a column is directly filtered"),
    spec!("ISCROSSFILTERED", 1, 1, "Whether a column is filtered through relationships"),
    spec!("ISINSCOPE", 1, 1, "Whether a column is a level in the current scope"),
    spec!("SELECTEDMEASURE", 0, 0, "The measure in context inside a calculation item"),
    spec!("SELECTEDMEASURENAME", 0, 0, "Name of the measure in context"),
    spec!("ISSELECTEDMEASURE", 1, VAR_ARGS, "Whether the measure in context is one of the listed"),
    spec!("CONTAINS", 3, VAR_ARGS, "Whether a table contains a row with the given values"),
    spec!("CONTAINSROW", 2, VAR_ARGS, "Whether a table contains the given row"),
    spec!("CONTAINSSTRING", 2, 2, "Case-insensitive substring test"),
    spec!("CONTAINSSTRINGEXACT", 2, 2, "Case-sensitive substring test"),
    spec!("USERNAME", 0, 0, "Domain and user name of the current connection"),
    spec!("USERPRINCIPALNAME", 0, 0, "User principal name of the current connection"),
    spec!("NAMEOF", 1, 1, "Fully qualified name of a column or measure"),

    // Math.
    spec!("ABS", 1, 1, "Absolute value"),
    spec!("ROUND", 2, 2, "Rounds to a number of digits"),
    spec!("ROUNDUP", 2, 2, "Rounds away from zero"),
    spec!("ROUNDDOWN", 2, 2, "Rounds toward zero"),
    spec!("INT", 1, 1, "Rounds down to the nearest integer"),
    spec!("TRUNC", 1, 2, "Truncates toward zero"),
    spec!("MOD", 2, 2, "Remainder after division"),
    spec!("POWER", 2, 2, "A number raised to a power"),
    spec!("SQRT", 1, 1, "Square root"),
    spec!("EXP", 1, 1, "e raised to a power"),
    spec!("LN", 1, 1, "Natural logarithm"),
    spec!("LOG", 1, 2, "Logarithm in a given base"),
    spec!("LOG10", 1, 1, "Base-10 logarithm"),
    spec!("SIGN", 1, 1, "Sign of a number"),
    spec!("QUOTIENT", 2, 2, "Integer portion of a division"),
    spec!("CEILING", 2, 2, "Rounds up to a multiple of significance"),
    spec!("FLOOR", 2, 2, "Rounds down to a multiple of significance"),
    spec!("MROUND", 2, 2, "Rounds to the nearest multiple"),
    spec!("RAND", 0, 0, "Uniform random number in [0, 1)"),
    spec!("RANDBETWEEN", 2, 2, "Random integer in an interval"),
    spec!("PI", 0, 0, "The constant pi"),
    spec!("CONVERT", 2, 2, "Casts an expression to a data type"),
    spec!("CURRENCY", 1, 1, "Casts an expression to currency"),

    // Text.
    spec!("BLANK", 0, 0, "The blank value"),
    spec!("CONCATENATE", 2, 2, "Joins two text strings"),
    spec!("CONCATENATEX", 2, VAR_ARGS, "Concatenates an expression over a table with a delimiter"),
    spec!("FORMAT", 2, 3, "Formats a value using a format string"),
    spec!("LEFT", 1, 2, "Leading characters of a string"),
    spec!("RIGHT", 1, 2, "Trailing characters of a string"),
    spec!("MID", 3, 3, "Substring by position and length"),
    spec!("LEN", 1, 1, "Length of a string"),
    spec!("LOWER", 1, 1, "Lowercases a string"),
    spec!("UPPER", 1, 1, "Uppercases a string"),
    spec!("TRIM", 1, 1, "Removes leading/trailing spaces"),
    spec!("SUBSTITUTE", 3, 4, "Replaces occurrences of text"),
    spec!("REPLACE", 4, 4, "Replaces text by position"),
    spec!("SEARCH", 2, 4, "Case-insensitive position of text"),
    spec!("FIND", 2, 4, "Case-sensitive position of text"),
    spec!("VALUE", 1, 1, "Converts text to a number"),
    spec!("FIXED", 1, 3, "Formats a number as text with fixed decimals"),
    spec!("REPT", 2, 2, "Repeats text a number of times"),
    spec!("UNICHAR", 1, 1, "Character for a Unicode code point"),
    spec!("UNICODE", 1, 1, "Code point of the first character"),
    spec!("EXACT", 2, 2, "Case-sensitive string equality"),

    // Date and time.
    spec!("DATE", 3, 3, "A date from year, month, day"),
    spec!("TIME", 3, 3, "A time from hour, minute, second"),
    spec!("DATEVALUE", 1, 1, "Parses a date from text"),
    spec!("TIMEVALUE", 1, 1, "Parses a time from text"),
    spec!("DAY", 1, 1, "Day of the month"),
    spec!("MONTH", 1, 1, "Month number"),
    spec!("YEAR", 1, 1, "Year number"),
    spec!("HOUR", 1, 1, "Hour of a datetime"),
    spec!("MINUTE", 1, 1, "Minute of a datetime"),
    spec!("SECOND", 1, 1, "Second of a datetime"),
    spec!("NOW", 0, 0, "Current date and time"),
    spec!("TODAY", 0, 0, "Current date"),
    spec!("UTCNOW", 0, 0, "Current UTC date and time"),
    spec!("UTCTODAY", 0, 0, "Current UTC date"),
    spec!("WEEKDAY", 1, 2, "Day of the week"),
    spec!("WEEKNUM", 1, 2, "Week number in the year"),
    spec!("EOMONTH", 2, 2, "Last day of a month offset from a date"),
    spec!("EDATE", 2, 2, "Date shifted by months"),
    spec!("CALENDAR", 2, 2, "A contiguous date table between two dates"),
    spec!("CALENDARAUTO", 0, 1, "A date table covering the model's date range"),
    spec!("DATEDIFF", 3, 3, "Interval count between two dates"),
    spec!("YEARFRAC", 2, 3, "Fraction of a year between two dates"),

    // Time intelligence.
    spec!("DATESYTD", 1, 2, "Year-to-date dates"),
    spec!("DATESQTD", 1, 1, "Quarter-to-date dates"),
    spec!("DATESMTD", 1, 1, "Month-to-date dates"),
    spec!("TOTALYTD", 2, 4, "Year-to-date value of an expression"),
    spec!("TOTALQTD", 2, 3, "Quarter-to-date value of an expression"),
    spec!("TOTALMTD", 2, 3, "Month-to-date value of an expression"),
    spec!("SAMEPERIODLASTYEAR", 1, 1, "The equivalent dates one year back"),
    spec!("PREVIOUSDAY", 1, 1, "The previous day"),
    spec!("PREVIOUSMONTH", 1, 1, "The previous month's dates"),
    spec!("PREVIOUSQUARTER", 1, 1, "The previous quarter's dates"),
    spec!("PREVIOUSYEAR", 1, 2, "The previous year's dates"),
    spec!("NEXTDAY", 1, 1, "The next day"),
    spec!("NEXTMONTH", 1, 1, "The next month's dates"),
    spec!("NEXTQUARTER", 1, 1, "The next quarter's dates"),
    spec!("NEXTYEAR", 1, 2, "The next year's dates"),
    spec!("DATEADD", 3, 3, "Dates shifted by an interval"),
    spec!("DATESBETWEEN", 3, 3, "Dates between two bounds"),
    spec!("DATESINPERIOD", 4, 4, "Dates in a period starting from a date"),
    spec!("FIRSTDATE", 1, 1, "First date in the current context"),
    spec!("LASTDATE", 1, 1, "Last date in the current context"),
    spec!("STARTOFMONTH", 1, 1, "First date of the month in context"),
    spec!("STARTOFQUARTER", 1, 1, "First date of the quarter in context"),
    spec!("STARTOFYEAR", 1, 2, "First date of the year in context"),
    spec!("ENDOFMONTH", 1, 1, "Last date of the month in context"),
    spec!("ENDOFQUARTER", 1, 1, "Last date of the quarter in context"),
    spec!("ENDOFYEAR", 1, 2, "Last date of the year in context"),

    // Statistical.
    spec!("RANKX", 2, 5, "Rank of each row against an expression over a table"),
    spec!("RANK.EQ", 2, 3, "Rank of a number within a column"),
    spec!("MEDIAN", 1, 1, "Median of a column"),
    spec!("MEDIANX", 2, 2, "Median of an expression over a table"),
    spec!("GEOMEAN", 1, 1, "Geometric mean of a column"),
    spec!("GEOMEANX", 2, 2, "Geometric mean of an expression over a table"),
    spec!("STDEV.P", 1, 1, "Population standard deviation of a column"),
    spec!("STDEV.S", 1, 1, "Sample standard deviation of a column"),
    spec!("STDEVX.P", 2, 2, "Population standard deviation of an expression"),
    spec!("STDEVX.S", 2, 2, "Sample standard deviation of an expression"),
    spec!("VAR.P", 1, 1, "Population variance of a column"),
    spec!("VAR.S", 1, 1, "Sample variance of a column"),
    spec!("VARX.P", 2, 2, "Population variance of an expression"),
    spec!("VARX.S", 2, 2, "Sample variance of an expression"),
    spec!("PERCENTILE.INC", 2, 2, "Inclusive percentile of a column"),
    spec!("PERCENTILE.EXC", 2, 2, "Exclusive percentile of a column"),
    spec!("PERCENTILEX.INC", 3, 3, "Inclusive percentile of an expression"),
    spec!("PERCENTILEX.EXC", 3, 3, "Exclusive percentile of an expression"),

    // Parent/child navigation.
    spec!("PATH", 2, 2, "Delimited ancestor chain for a parent/child hierarchy"),
    spec!("PATHITEM", 2, 3, "Item at a position in a PATH result"),
    spec!("PATHITEMREVERSE", 2, 3, "Item at a position counting from the leaf"),
    spec!("PATHLENGTH", 1, 1, "Number of items in a PATH result"),
    spec!("PATHCONTAINS", 2, 2, "Whether a PATH result contains an item"),
];

fn registry() -> &'static HashMap<String, &'static FunctionSpec> {
    static REGISTRY: OnceLock<HashMap<String, &'static FunctionSpec>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::with_capacity(BUILTINS.len());
        for spec in BUILTINS {
            map.insert(spec.name.to_ascii_uppercase(), spec);
        }
        map
    })
}

/// Case-insensitive lookup of a function by name.
pub fn lookup(name: &str) -> Option<&'static FunctionSpec> {
    registry().get(&name.to_ascii_uppercase()).copied()
}

/// Case-insensitive prefix search over the catalog, name-sorted. Feeds
/// editor completion; an empty prefix returns the whole catalog.
pub fn search(prefix: &str) -> Vec<&'static FunctionSpec> {
    let upper = prefix.to_ascii_uppercase();
    let mut hits: Vec<&'static FunctionSpec> = BUILTINS
        .iter()
        .filter(|spec| spec.name.starts_with(&upper))
        .collect();
    hits.sort_by_key(|spec| spec.name);
    hits
}

/// Every registered function, in catalog order.
pub fn iter() -> impl Iterator<Item = &'static FunctionSpec> {
    BUILTINS.iter()
}
