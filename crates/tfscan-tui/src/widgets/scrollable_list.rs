//! Selectable list with a scroll window, shared by the candidate and hit panes.

pub struct SelectableList<T> {
    items: Vec<T>,
    selected: usize,
    scroll_offset: usize,
}

impl<T> SelectableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the contents, resetting cursor and scroll.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    /// Move the cursor to the first item matching `pred`.
    pub fn select_where(&mut self, pred: impl Fn(&T) -> bool) -> bool {
        match self.items.iter().position(pred) {
            Some(pos) => {
                self.selected = pos;
                true
            }
            None => false,
        }
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// `(index, item)` pairs inside a window of `height` rows.
    /// Call `ensure_visible` first.
    pub fn visible_items(&self, height: usize) -> Vec<(usize, &T)> {
        if height == 0 || self.items.is_empty() {
            return Vec::new();
        }
        let start = self.scroll_offset.min(self.items.len());
        let end = (start + height).min(self.items.len());
        (start..end).map(|i| (i, &self.items[i])).collect()
    }

    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// Click on `row` of the rendered window. Returns true if it hit an item.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.items.len() {
            self.selected = target;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for SelectableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> SelectableList<usize> {
        let mut l = SelectableList::new();
        l.set_items((0..n).collect());
        l
    }

    #[test]
    fn test_navigation_clamps() {
        let mut l = list(3);
        l.select_up(1);
        assert_eq!(l.selected_index(), 0);
        l.select_down(10);
        assert_eq!(l.selected_item(), Some(&2));
        l.select_first();
        assert_eq!(l.selected_item(), Some(&0));
        l.select_last();
        assert_eq!(l.selected_index(), 2);
    }

    #[test]
    fn test_window_follows_cursor() {
        let mut l = list(10);
        l.select_down(6);
        l.ensure_visible(4);
        let rows: Vec<usize> = l.visible_items(4).into_iter().map(|(i, _)| i).collect();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        l.select_up(5);
        l.ensure_visible(4);
        assert_eq!(l.visible_items(4)[0].0, 1);
    }

    #[test]
    fn test_click_and_select_where() {
        let mut l = list(5);
        assert!(l.handle_click(2));
        assert_eq!(l.selected_index(), 2);
        assert!(!l.handle_click(9));
        assert!(l.select_where(|&x| x == 4));
        assert!(!l.select_where(|&x| x == 7));
        assert_eq!(l.selected_index(), 4);
    }

    #[test]
    fn test_set_items_resets() {
        let mut l = list(5);
        l.select_last();
        l.set_items(vec![9]);
        assert_eq!(l.selected_item(), Some(&9));
        let empty: SelectableList<u8> = SelectableList::default();
        assert!(empty.is_empty());
        assert!(empty.visible_items(3).is_empty());
    }
}
