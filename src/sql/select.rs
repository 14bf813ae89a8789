use tracing::debug;

use crate::{
    ast::QueryTree,
    error::{Error, Result},
};

use super::{Compiler, Query, Statement};

/// `LIMIT` and `OFFSET` are bound as BIGINT.
const MAX_BIGINT: u64 = i64::MAX as u64;

impl Compiler<'_> {
    /// Parses `query.search` and compiles the select for it.
    pub fn select(&self, query: &Query) -> Result<Statement> {
        let tree = self.parse(&query.search)?;
        self.select_tree(&tree, query)
    }

    /// Compiles a select for an already parsed search.
    ///
    /// A non-empty `summary` produces a grouped count and ignores `size`,
    /// `skip` and `sort`. Otherwise rows are ordered by `sort` (the primary
    /// field when empty) and paged with one extra row so that callers can
    /// tell whether another page exists.
    pub fn select_tree(&self, tree: &QueryTree, query: &Query) -> Result<Statement> {
        let summary = self.names(&query.summary)?;
        if !summary.is_empty() {
            return self.summary(tree, &summary);
        }

        let size = self.page_size(query.size)?;
        if query.skip > MAX_BIGINT {
            return Err(Error::InvalidRequest(format!(
                "skip {} is out of range",
                query.skip
            )));
        }
        let mut frame = self.frame();
        let projection = frame.projection(self.options)?;
        let predicate = frame.predicate(&tree.root)?;

        let mut order = Vec::new();
        for name in self.names(&query.sort)? {
            let (name, descending) = match name.strip_prefix('-') {
                Some(rest) => (rest.to_string(), true),
                None => (name, false),
            };
            let column = frame.column(self.schema.require(&name)?)?;
            order.push(if descending {
                format!("{} DESC", column)
            } else {
                column
            });
        }
        if order.is_empty()
            && let Some(primary) = self.schema.field(self.primary())
        {
            order.push(frame.column(primary)?);
        }

        let mut sql = format!("SELECT {} FROM {}", projection, self.schema.table);
        sql.push_str(&frame.joins(self.options));
        if let Some(predicate) = predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            size.saturating_add(1),
            query.skip
        ));

        let stmt = frame.finish(sql);
        debug!(
            table = %self.schema.table,
            params = stmt.params.len(),
            size,
            skip = query.skip,
            "compiled select"
        );
        Ok(stmt)
    }

    fn summary(&self, tree: &QueryTree, names: &[String]) -> Result<Statement> {
        let mut frame = self.frame();
        let predicate = frame.predicate(&tree.root)?;

        let mut groups = Vec::with_capacity(names.len());
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let field = self.schema.require(name)?;
            let expr = frame.column(field)?;
            columns.push(if expr == field.name {
                expr.clone()
            } else {
                format!("{} AS {}", expr, field.name)
            });
            groups.push(expr);
        }

        let mut sql = format!(
            "SELECT {}, count(*) AS count FROM {}",
            columns.join(", "),
            self.schema.table
        );
        sql.push_str(&frame.joins(self.options));
        if let Some(predicate) = predicate {
            sql.push_str(" WHERE ");
            sql.push_str(&predicate);
        }
        sql.push_str(" GROUP BY ");
        sql.push_str(&groups.join(", "));

        let stmt = frame.finish(sql);
        debug!(
            table = %self.schema.table,
            params = stmt.params.len(),
            groups = names.len(),
            "compiled summary"
        );
        Ok(stmt)
    }

    fn page_size(&self, size: Option<u64>) -> Result<u64> {
        match size {
            None => Ok(self.config.default_page_size),
            Some(size) if size > self.config.max_page_size || size >= MAX_BIGINT => {
                Err(Error::InvalidRequest(format!(
                    "page size {} exceeds the maximum of {}",
                    size,
                    self.config.max_page_size.min(MAX_BIGINT - 1)
                )))
            }
            Some(size) => Ok(size),
        }
    }
}
