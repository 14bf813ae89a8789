use tracing::debug;

use crate::{
    error::{Error, Result},
    value::{FieldValue, Param},
};

use super::{Compiler, Frame, Statement};

impl Compiler<'_> {
    /// Compiles an insert of `set` fields from positional `params`.
    ///
    /// Reference fields take the business key and store the surrogate key.
    /// With an upsert configured on the schema, conflicts on its target update
    /// its columns instead. The statement returns the projected row.
    pub fn insert(&self, set: &[&str], params: Vec<Param>) -> Result<Statement> {
        expect_params("insert", set.len(), params.len())?;
        if set.is_empty() {
            return Err(Error::InvalidRequest("insert sets no fields".to_string()));
        }

        let mut frame = self.frame();
        let mut columns = Vec::with_capacity(set.len());
        let mut values = Vec::with_capacity(set.len());
        for (name, param) in set.iter().zip(params) {
            let field = self.schema.require(name)?;
            columns.push(frame.stored_column(field)?);
            values.push(frame.stored_value(field, param));
        }

        let mut write = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.schema.table,
            columns.join(", "),
            values.join(", ")
        );

        if let Some(upsert) = &self.schema.upsert {
            let target = upsert
                .target
                .iter()
                .map(|name| frame.stored_column(self.schema.require(name)?))
                .collect::<Result<Vec<_>>>()?;
            let update = upsert
                .update
                .iter()
                .map(|name| {
                    let column = frame.stored_column(self.schema.require(name)?)?;
                    Ok(format!("{c} = EXCLUDED.{c}", c = column))
                })
                .collect::<Result<Vec<_>>>()?;

            write.push_str(&format!(" ON CONFLICT ({})", target.join(", ")));
            if update.is_empty() {
                write.push_str(" DO NOTHING");
            } else {
                write.push_str(&format!(" DO UPDATE SET {}", update.join(", ")));
            }
        }

        self.returning(frame, write, "insert")
    }

    /// Compiles an update of `set` fields on the rows matching `keys`.
    ///
    /// `params` holds one value per set field followed by one per key.
    pub fn update(&self, set: &[&str], keys: &[&str], params: Vec<Param>) -> Result<Statement> {
        expect_params("update", set.len() + keys.len(), params.len())?;
        if set.is_empty() {
            return Err(Error::InvalidRequest("update sets no fields".to_string()));
        }
        if keys.is_empty() {
            return Err(Error::InvalidRequest(
                "update requires at least one key".to_string(),
            ));
        }

        let mut frame = self.frame();
        let mut params = params.into_iter();

        let mut assignments = Vec::with_capacity(set.len());
        for (name, param) in set.iter().zip(params.by_ref()) {
            let field = self.schema.require(name)?;
            let column = frame.stored_column(field)?;
            let value = frame.stored_value(field, param);
            assignments.push(format!("{} = {}", column, value));
        }
        let condition = self.key_condition(&mut frame, keys, params)?;

        let write = format!(
            "UPDATE {} SET {} WHERE {}",
            self.schema.table,
            assignments.join(", "),
            condition
        );
        self.returning(frame, write, "update")
    }

    /// Compiles an update from typed values, skipping unset ones.
    ///
    /// Explicit nulls are written as `NULL`.
    pub fn patch(
        &self,
        values: &[(&str, FieldValue)],
        keys: &[&str],
        key_params: Vec<Param>,
    ) -> Result<Statement> {
        let mut set = Vec::with_capacity(values.len());
        let mut params = Vec::with_capacity(values.len() + key_params.len());
        for (name, value) in values {
            if let Some(param) = value.to_param() {
                set.push(*name);
                params.push(param);
            }
        }
        params.extend(key_params);
        self.update(&set, keys, params)
    }

    /// Compiles a delete of the rows matching `keys`.
    ///
    /// A delete without keys would empty the table and is rejected.
    pub fn delete(&self, keys: &[&str], params: Vec<Param>) -> Result<Statement> {
        if keys.is_empty() || params.is_empty() {
            return Err(Error::InvalidRequest(
                "delete requires at least one key".to_string(),
            ));
        }
        expect_params("delete", keys.len(), params.len())?;

        let mut frame = self.frame();
        let condition = self.key_condition(&mut frame, keys, params.into_iter())?;
        let sql = format!("DELETE FROM {} WHERE {}", self.schema.table, condition);

        let stmt = frame.finish(sql);
        debug!(table = %self.schema.table, params = stmt.params.len(), "compiled delete");
        Ok(stmt)
    }

    fn key_condition(
        &self,
        frame: &mut Frame<'_>,
        keys: &[&str],
        params: impl Iterator<Item = Param>,
    ) -> Result<String> {
        let mut conditions = Vec::with_capacity(keys.len());
        for (name, param) in keys.iter().zip(params) {
            let field = self.schema.require(name)?;
            let column = frame.stored_column(field)?;
            let value = frame.stored_value(field, param);
            conditions.push(format!("{} = {}", column, value));
        }
        Ok(conditions.join(" AND "))
    }

    /// Wraps a write so that it yields the same projection as a select.
    fn returning(&self, mut frame: Frame<'_>, write: String, kind: &str) -> Result<Statement> {
        let projection = frame.projection(self.options)?;
        let sql = format!(
            "WITH affected AS ({} RETURNING *) SELECT {} FROM affected AS {}{}",
            write,
            projection,
            self.schema.table,
            frame.joins(self.options)
        );

        let stmt = frame.finish(sql);
        debug!(table = %self.schema.table, params = stmt.params.len(), "compiled {}", kind);
        Ok(stmt)
    }
}

fn expect_params(kind: &str, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(Error::InvalidRequest(format!(
            "{} expects {} parameters, got {}",
            kind, expected, got
        )));
    }
    Ok(())
}
